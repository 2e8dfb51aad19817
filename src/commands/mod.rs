//! Action handlers.
//!
//! Each file in this module corresponds to one user-facing action:
//!
//! | File           | Invocation                   | Description                                |
//! |----------------|------------------------------|--------------------------------------------|
//! | `create.rs`    | `borgwrap create`            | Hooks, new archive, then prune             |
//! | `list.rs`      | `borgwrap list`              | List archives in the repository            |
//! | `prune.rs`     | `borgwrap prune`             | Apply the retention policy                 |
//! | `check_age.rs` | `borgwrap nagios-check-age`  | Monitoring probe for the latest archive    |
//! | `hooks.rs`     | -                            | `before`/`after` shell hooks               |

pub mod check_age;
pub mod create;
pub mod hooks;
pub mod list;
pub mod prune;
