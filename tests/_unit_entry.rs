// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

#![allow(clippy::all)]

mod unit_tests {
    pub mod usm_user_config_localization;
    pub mod walk_table_grouping;
}
