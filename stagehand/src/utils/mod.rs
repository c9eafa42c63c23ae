//! Shell invocation and command templates.

mod shell;
mod template;

pub use shell::{quote_arg, ShellRunner};
pub use template::{placeholders, render};
