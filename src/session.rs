// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the supervisor which runs a control session and everything it needs to bring
//! the arm back into a safe state, however the session ends.

pub mod cancel;
pub mod safe_return;
pub mod session_state;
pub mod supervisor;
