// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the joint controller, the friction estimator and the helpers they use.

pub mod control_tools;
pub mod friction;
pub mod joint_controller;
pub mod low_pass_filter;
