// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains everything describing the arm: the interface the control loop drives,
//! the per-cycle joint types, the Jaco2 constants and a simulated arm.

pub mod arm_interface;
pub mod jaco2;
pub mod joint_state;
pub mod simulated_arm;
