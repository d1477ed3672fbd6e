//! Diagnostics
//!
//! [`init`] sets up `tracing` for binaries. [`Logger`] is the small printf-style
//! logger for byte sinks such as a serial port, filtered by a [`Level`].
//!
//! Supported directives:
//!
//! | Directive   | Output                                   |
//! |-------------|------------------------------------------|
//! | `%s` `%S`   | string                                   |
//! | `%d` `%i`   | signed decimal                           |
//! | `%l`        | signed decimal                           |
//! | `%D` `%F`   | float with two decimals                  |
//! | `%x` `%X`   | uppercase hex, `%X` prefixed with `0x`   |
//! | `%b` `%B`   | binary, `%B` prefixed with `0b`          |
//! | `%c`        | character                                |
//! | `%t` `%T`   | `T`/`F` or `true`/`false`                |
//! | `%%`        | a literal `%`                            |
//!
//! Any other directive prints nothing and consumes no argument.

use core::{fmt::Display, str::FromStr};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a global `tracing` subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Silent = 0,
    Fatal = 1,
    Error = 2,
    Warning = 3,
    Notice = 4,
    Trace = 5,
    Verbose = 6,
}

impl Level {
    const ALL: [Level; 7] = [
        Level::Silent,
        Level::Fatal,
        Level::Error,
        Level::Warning,
        Level::Notice,
        Level::Trace,
        Level::Verbose,
    ];

    /// Level for an ordinal, clamped into `Silent..=Verbose`.
    pub fn from_ordinal_clamped(ordinal: i32) -> Self {
        Self::ALL[ordinal.clamp(0, 6) as usize]
    }

    /// Letter printed in front of a line when levels are shown.
    pub fn code(self) -> Option<char> {
        match self {
            Level::Silent => None,
            Level::Fatal => Some('F'),
            Level::Error => Some('E'),
            Level::Warning => Some('W'),
            Level::Notice => Some('N'),
            Level::Trace => Some('T'),
            Level::Verbose => Some('V'),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Level::Silent => "silent",
            Level::Fatal => "fatal",
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Notice => "notice",
            Level::Trace => "trace",
            Level::Verbose => "verbose",
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = &'static str;

    /// Accepts a level name (any case) or an ordinal from 0 to 6.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(ordinal) = s.parse::<i32>() {
            return if (0..=6).contains(&ordinal) {
                Ok(Self::from_ordinal_clamped(ordinal))
            } else {
                Err("level ordinal must be between 0 and 6")
            };
        }

        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or("expected silent, fatal, error, warning, notice, trace or verbose")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Decimal,
    Hex,
    Binary,
}

/// Character output for [`Logger`].
///
/// Every [`core::fmt::Write`] is a sink; write errors are dropped.
pub trait Sink {
    fn print_char(&mut self, c: char);
    fn print_str(&mut self, s: &str);
    fn print_int(&mut self, value: i64, radix: Radix);
    fn print_float(&mut self, value: f64);

    fn println(&mut self) {
        self.print_str("\n");
    }
}

impl<W: core::fmt::Write> Sink for W {
    fn print_char(&mut self, c: char) {
        let _ = self.write_char(c);
    }

    fn print_str(&mut self, s: &str) {
        let _ = self.write_str(s);
    }

    fn print_int(&mut self, value: i64, radix: Radix) {
        let _ = match radix {
            Radix::Decimal => write!(self, "{value}"),
            // negative numbers print as their 32-bit two's complement
            Radix::Hex => write!(self, "{:X}", value as u32),
            Radix::Binary => write!(self, "{:b}", value as u32),
        };
    }

    fn print_float(&mut self, value: f64) {
        let _ = write!(self, "{value:.2}");
    }
}

/// One directive argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    Str(&'a str),
    Int(i64),
    Float(f64),
    Char(char),
    Bool(bool),
}

impl Arg<'_> {
    fn as_int(&self) -> i64 {
        match *self {
            Arg::Int(v) => v,
            Arg::Float(v) => v as i64,
            Arg::Char(v) => i64::from(u32::from(v)),
            Arg::Bool(v) => i64::from(v),
            Arg::Str(_) => 0,
        }
    }

    fn as_float(&self) -> f64 {
        match *self {
            Arg::Float(v) => v,
            other => other.as_int() as f64,
        }
    }

    fn is_true(&self) -> bool {
        match *self {
            Arg::Bool(v) => v,
            other => other.as_int() == 1,
        }
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Str(value)
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(value: &'a String) -> Self {
        Arg::Str(value)
    }
}

macro_rules! int_args {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg<'_> {
                fn from(value: $ty) -> Self {
                    Arg::Int(value.into())
                }
            }
        )*
    };
}

int_args!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Arg<'_> {
    fn from(value: f32) -> Self {
        Arg::Float(value.into())
    }
}

impl From<f64> for Arg<'_> {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

impl From<char> for Arg<'_> {
    fn from(value: char) -> Self {
        Arg::Char(value)
    }
}

impl From<bool> for Arg<'_> {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

/// Builds a `&[Arg]` from mixed values.
///
/// ```
/// use wthing::{log::{Level, Logger}, log_args};
///
/// let mut logger = Logger::new(Level::Warning, String::new(), true);
/// logger.warning("%s is %d", log_args!["count", 42]);
/// assert_eq!(logger.sink(), "W: count is 42\n");
/// ```
#[macro_export]
macro_rules! log_args {
    ($($arg:expr),* $(,)?) => {
        &[$($crate::log::Arg::from($arg)),*]
    };
}

/// Severity-filtered printf-style logger over a [`Sink`].
pub struct Logger<S: Sink> {
    level: Level,
    show_level: bool,
    sink: S,
    prefix: Option<fn(&mut S)>,
    suffix: Option<fn(&mut S)>,
}

impl<S: Sink> Logger<S> {
    pub fn new(level: Level, sink: S, show_level: bool) -> Self {
        Self { level, show_level, sink, prefix: None, suffix: None }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    pub fn set_level_clamped(&mut self, ordinal: i32) {
        self.level = Level::from_ordinal_clamped(ordinal);
    }

    pub fn set_show_level(&mut self, show_level: bool) {
        self.show_level = show_level;
    }

    /// Called before every emitted line, after the level filter.
    pub fn set_prefix(&mut self, prefix: fn(&mut S)) {
        self.prefix = Some(prefix);
    }

    /// Called after the line terminator of every emitted line.
    pub fn set_suffix(&mut self, suffix: fn(&mut S)) {
        self.suffix = Some(suffix);
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn fatal(&mut self, format: &str, args: &[Arg<'_>]) {
        self.log(Level::Fatal, format, args);
    }

    pub fn error(&mut self, format: &str, args: &[Arg<'_>]) {
        self.log(Level::Error, format, args);
    }

    pub fn warning(&mut self, format: &str, args: &[Arg<'_>]) {
        self.log(Level::Warning, format, args);
    }

    pub fn notice(&mut self, format: &str, args: &[Arg<'_>]) {
        self.log(Level::Notice, format, args);
    }

    pub fn trace(&mut self, format: &str, args: &[Arg<'_>]) {
        self.log(Level::Trace, format, args);
    }

    pub fn verbose(&mut self, format: &str, args: &[Arg<'_>]) {
        self.log(Level::Verbose, format, args);
    }

    pub fn log(&mut self, level: Level, format: &str, args: &[Arg<'_>]) {
        if level == Level::Silent || level > self.level {
            return;
        }

        if let Some(prefix) = self.prefix {
            prefix(&mut self.sink);
        }

        if self.show_level
            && let Some(code) = level.code()
        {
            self.sink.print_char(code);
            self.sink.print_str(": ");
        }

        self.print(format, args);
        self.sink.println();

        if let Some(suffix) = self.suffix {
            suffix(&mut self.sink);
        }
    }

    fn print(&mut self, format: &str, args: &[Arg<'_>]) {
        let mut args = args.iter();
        let mut chars = format.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                self.sink.print_char(c);
                continue;
            }

            let Some(directive) = chars.next() else {
                break;
            };

            if directive == '%' {
                self.sink.print_char('%');
                continue;
            }

            if !matches!(
                directive,
                's' | 'S' | 'd' | 'i' | 'D' | 'F' | 'x' | 'X' | 'b' | 'B' | 'l' | 'c' | 't' | 'T'
            ) {
                continue;
            }

            let Some(arg) = args.next() else {
                continue;
            };

            self.print_directive(directive, arg);
        }
    }

    fn print_directive(&mut self, directive: char, arg: &Arg<'_>) {
        let sink = &mut self.sink;
        match directive {
            's' | 'S' => match *arg {
                Arg::Str(s) => sink.print_str(s),
                Arg::Char(c) => sink.print_char(c),
                Arg::Int(v) => sink.print_int(v, Radix::Decimal),
                Arg::Float(v) => sink.print_float(v),
                Arg::Bool(v) => sink.print_str(if v { "true" } else { "false" }),
            },
            'd' | 'i' | 'l' => sink.print_int(arg.as_int(), Radix::Decimal),
            'D' | 'F' => sink.print_float(arg.as_float()),
            'x' => sink.print_int(arg.as_int(), Radix::Hex),
            'X' => {
                sink.print_str("0x");
                sink.print_int(arg.as_int(), Radix::Hex);
            }
            'b' => sink.print_int(arg.as_int(), Radix::Binary),
            'B' => {
                sink.print_str("0b");
                sink.print_int(arg.as_int(), Radix::Binary);
            }
            'c' => match *arg {
                Arg::Char(c) => sink.print_char(c),
                other => {
                    if let Some(c) = u32::try_from(other.as_int()).ok().and_then(char::from_u32) {
                        sink.print_char(c);
                    }
                }
            },
            't' => sink.print_char(if arg.is_true() { 'T' } else { 'F' }),
            'T' => sink.print_str(if arg.is_true() { "true" } else { "false" }),
            _ => {}
        }
    }
}

impl<S: Sink + core::fmt::Debug> core::fmt::Debug for Logger<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("show_level", &self.show_level)
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}
