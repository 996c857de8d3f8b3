use std::cell::RefCell;
use std::fmt::Display;
use std::path::Path;

use colored::Colorize;

use crate::error::LmcError;
use crate::snapshot::StateSnapshot;

/// Print a line of step-mode output to stderr.
#[macro_export]
macro_rules! dprintln {
    ( $cond:expr ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        $crate::output::Output::Debugger($cond).print_str("\n");
    }};
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            concat!($fmt, "\n")
            $($tt)*
        );
        $crate::output::Output::Debugger($cond).print_str(&s);
    }};
}

#[derive(Clone, Copy, Debug)]
pub enum Output {
    /// Program results, on stdout.
    Normal,
    /// Stepper and trace messages, on stderr.
    Debugger(Condition),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Printed even with `--minimal`, without colour.
    Always,
    /// Hidden with `--minimal`.
    Sometimes,
}

#[derive(Clone, Copy, Debug)]
pub enum MsgColor {
    Green,
    Cyan,
    Yellow,
    Red,
}

impl Output {
    thread_local! {
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    /// Minimal output also disables colour for the whole process.
    pub fn set_minimal(new_value: bool) -> bool {
        if new_value {
            colored::control::set_override(false);
        }
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }

    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Normal => print!("{}", string),
            Self::Debugger(condition) => match (Self::is_minimal(), *condition) {
                (false, _) => eprint!("{}", string.blue()),
                (true, Condition::Always) => eprint!("{}", string),
                (true, Condition::Sometimes) => (),
            },
        }
    }

    pub fn print_snapshot(&self, snapshot: &StateSnapshot) {
        self.print_str(&format!("{snapshot}\n"));
    }
}

/// Right-aligned status word followed by a description, like `   Assembling target x.lmc`.
///
/// Hidden with `--minimal`, so stdout only carries program results.
pub fn message<L, R>(color: MsgColor, left: L, right: R)
where
    L: Display,
    R: Display,
{
    if Output::is_minimal() {
        return;
    }
    println!("{:>12} {right}", paint(color, left));
}

pub fn file_message(color: MsgColor, left: &str, path: &Path) {
    message(color, left, format!("target {}", path.display()));
}

/// Report an assembly problem that was recovered from.
pub fn warning(warning: &LmcError) {
    eprintln!("{:>12} {warning}", paint(MsgColor::Yellow, "Warning"));
}

fn paint(color: MsgColor, text: impl Display) -> colored::ColoredString {
    let text = text.to_string();
    match color {
        MsgColor::Green => text.green(),
        MsgColor::Cyan => text.cyan(),
        MsgColor::Yellow => text.yellow(),
        MsgColor::Red => text.red(),
    }
}
