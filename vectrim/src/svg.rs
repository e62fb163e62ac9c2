//! SVG path-data codec.
//!
//! Parsing accepts the full move/line/curve/close vocabulary (absolute and
//! relative, `H`/`V`, smooth and quadratic curves) and normalises it to
//! absolute `MoveTo`/`LineTo`/`CurveTo`/`Close` commands. Writing always
//! emits absolute `M`/`L`/`C`/`Z`.

use crate::geometry::curve::Curve;
use crate::geometry::limits;
use crate::model::{Command, SubPath, Vec2};
use std::fmt;
use std::fmt::Write as _;

#[derive(Clone, Debug, PartialEq)]
pub enum PathDataError {
    /// `d` string longer than the ingestion cap
    TooLong(usize),
    TooManyCommands,
    TooManySubpaths,
    /// Drawing command before any move-to
    MissingMoveTo { offset: usize },
    UnexpectedToken { offset: usize, found: char },
    /// Number missing, unparsable or out of coordinate bounds
    BadNumber { offset: usize },
}

impl fmt::Display for PathDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathDataError::TooLong(n) => write!(f, "path data is {} characters, limit is {}", n, limits::MAX_PATH_DATA_LEN),
            PathDataError::TooManyCommands => write!(f, "path data has more than {} commands", limits::MAX_PATH_COMMANDS),
            PathDataError::TooManySubpaths => write!(f, "path data has more than {} subpaths", limits::MAX_SUBPATHS),
            PathDataError::MissingMoveTo { offset } => write!(f, "drawing command at {} before any move-to", offset),
            PathDataError::UnexpectedToken { offset, found } => write!(f, "unexpected '{}' at {}", found, offset),
            PathDataError::BadNumber { offset } => write!(f, "invalid number at {}", offset),
        }
    }
}

impl std::error::Error for PathDataError {}

struct Scanner<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> Scanner<'a> {
    fn skip_ws(&mut self) {
        while self.i < self.bytes.len() {
            match self.bytes[self.i] {
                b' ' | b'\n' | b'\t' | b'\r' | b',' => self.i += 1,
                _ => break,
            }
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.i >= self.bytes.len()
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.i).copied()
    }

    fn next_is_number(&mut self) -> bool {
        matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'-' || c == b'+' || c == b'.')
    }

    // sign? digits? ('.' digits?)? (('e'|'E') sign? digits)?
    fn number(&mut self) -> Result<f64, PathDataError> {
        self.skip_ws();
        let start = self.i;
        let b = self.bytes;
        if self.i < b.len() && (b[self.i] == b'-' || b[self.i] == b'+') {
            self.i += 1;
        }
        let mut digits = 0;
        while self.i < b.len() && b[self.i].is_ascii_digit() {
            self.i += 1;
            digits += 1;
        }
        if self.i < b.len() && b[self.i] == b'.' {
            self.i += 1;
            while self.i < b.len() && b[self.i].is_ascii_digit() {
                self.i += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return Err(PathDataError::BadNumber { offset: start });
        }
        if self.i < b.len() && (b[self.i] == b'e' || b[self.i] == b'E') {
            let mark = self.i;
            self.i += 1;
            if self.i < b.len() && (b[self.i] == b'-' || b[self.i] == b'+') {
                self.i += 1;
            }
            let exp_start = self.i;
            while self.i < b.len() && b[self.i].is_ascii_digit() {
                self.i += 1;
            }
            if self.i == exp_start {
                self.i = mark;
            }
        }
        let text = std::str::from_utf8(&b[start..self.i]).map_err(|_| PathDataError::BadNumber { offset: start })?;
        let v = text.parse::<f64>().map_err(|_| PathDataError::BadNumber { offset: start })?;
        if limits::in_coord_bounds(v) {
            Ok(v)
        } else {
            Err(PathDataError::BadNumber { offset: start })
        }
    }

    fn point(&mut self, rel: bool, cur: Vec2) -> Result<Vec2, PathDataError> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(if rel { Vec2::new(cur.x + x, cur.y + y) } else { Vec2::new(x, y) })
    }
}

#[derive(Default)]
struct Builder {
    subpaths: Vec<SubPath>,
    current: Vec<Command>,
    commands: usize,
}

impl Builder {
    fn push(&mut self, cmd: Command) -> Result<(), PathDataError> {
        self.commands += 1;
        if self.commands > limits::MAX_PATH_COMMANDS {
            return Err(PathDataError::TooManyCommands);
        }
        if let Command::MoveTo { .. } = cmd {
            self.flush()?;
        }
        self.current.push(cmd);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PathDataError> {
        if !self.current.is_empty() {
            if self.subpaths.len() >= limits::MAX_SUBPATHS {
                return Err(PathDataError::TooManySubpaths);
            }
            self.subpaths.push(SubPath { commands: std::mem::take(&mut self.current) });
        }
        Ok(())
    }
}

/// Parse SVG path data into absolute subpaths.
pub fn parse_path_data(d: &str) -> Result<Vec<SubPath>, PathDataError> {
    if d.len() > limits::MAX_PATH_DATA_LEN {
        return Err(PathDataError::TooLong(d.len()));
    }
    let mut s = Scanner { bytes: d.as_bytes(), i: 0 };
    let mut out = Builder::default();
    let mut cur = Vec2::default();
    let mut start_sub = Vec2::default();
    let mut started = false;
    let mut open = false; // a subpath is in progress (no Z yet)
    let mut last_cmd: Option<u8> = None;
    // Reflection source for S/T: last cubic c2 / last quadratic control
    let mut last_c2: Option<Vec2> = None;
    let mut last_q: Option<Vec2> = None;

    while !s.at_end() {
        let offset = s.i;
        let c = s.bytes[s.i];
        let cmd = if c.is_ascii_alphabetic() {
            s.i += 1;
            c
        } else {
            match last_cmd {
                // Extra coordinate pairs after a move-to are line-tos
                Some(b'M') => b'L',
                Some(b'm') => b'l',
                Some(b'Z') | Some(b'z') | None => return Err(PathDataError::UnexpectedToken { offset, found: c as char }),
                Some(prev) => prev,
            }
        };
        let rel = cmd.is_ascii_lowercase();
        let upper = cmd.to_ascii_uppercase();
        if upper != b'M' && !started {
            return Err(PathDataError::MissingMoveTo { offset });
        }
        // Drawing after Z continues from the closed subpath's start
        if upper != b'M' && upper != b'Z' && !open {
            out.push(Command::MoveTo { x: start_sub.x, y: start_sub.y })?;
            open = true;
        }
        let mut c2 = None;
        let mut q = None;
        match upper {
            b'M' => {
                let p = s.point(rel, cur)?;
                out.push(Command::MoveTo { x: p.x, y: p.y })?;
                cur = p;
                start_sub = p;
                started = true;
                open = true;
            }
            b'L' => {
                let p = s.point(rel, cur)?;
                out.push(Command::LineTo { x: p.x, y: p.y })?;
                cur = p;
            }
            b'H' => {
                let x = s.number()?;
                let x = if rel { cur.x + x } else { x };
                out.push(Command::LineTo { x, y: cur.y })?;
                cur.x = x;
            }
            b'V' => {
                let y = s.number()?;
                let y = if rel { cur.y + y } else { y };
                out.push(Command::LineTo { x: cur.x, y })?;
                cur.y = y;
            }
            b'C' | b'S' => {
                let p1 = if upper == b'C' {
                    s.point(rel, cur)?
                } else {
                    match last_c2 {
                        Some(prev) => Vec2::new(2.0 * cur.x - prev.x, 2.0 * cur.y - prev.y),
                        None => cur,
                    }
                };
                let p2 = s.point(rel, cur)?;
                let p = s.point(rel, cur)?;
                out.push(Command::CurveTo { x1: p1.x, y1: p1.y, x2: p2.x, y2: p2.y, x: p.x, y: p.y })?;
                cur = p;
                c2 = Some(p2);
            }
            b'Q' | b'T' => {
                let ctrl = if upper == b'Q' {
                    s.point(rel, cur)?
                } else {
                    match last_q {
                        Some(prev) => Vec2::new(2.0 * cur.x - prev.x, 2.0 * cur.y - prev.y),
                        None => cur,
                    }
                };
                let p = s.point(rel, cur)?;
                // Degree elevation keeps the curve exact
                let p1 = cur.lerp(ctrl, 2.0 / 3.0);
                let p2 = p.lerp(ctrl, 2.0 / 3.0);
                out.push(Command::CurveTo { x1: p1.x, y1: p1.y, x2: p2.x, y2: p2.y, x: p.x, y: p.y })?;
                cur = p;
                q = Some(ctrl);
            }
            b'Z' => {
                if open {
                    out.push(Command::Close)?;
                    open = false;
                }
                cur = start_sub;
            }
            _ => return Err(PathDataError::UnexpectedToken { offset, found: cmd as char }),
        }
        last_c2 = c2;
        last_q = q;
        last_cmd = Some(cmd);
        if upper == b'Z' {
            continue;
        }
        // Commands other than M/Z repeat implicitly; handled by the loop
        if !s.next_is_number() && !s.at_end() && !matches!(s.peek(), Some(c) if c.is_ascii_alphabetic()) {
            let at = s.i;
            return Err(PathDataError::UnexpectedToken { offset: at, found: s.bytes[at] as char });
        }
    }
    out.flush()?;
    Ok(out.subpaths)
}

/// Shortest decimal that round-trips, without a trailing `.0`.
pub(crate) fn fmt_num(out: &mut String, v: f64) {
    let v = if v == 0.0 { 0.0 } else { v };
    let _ = write!(out, "{}", v);
}

fn push_point(out: &mut String, p: Vec2) {
    fmt_num(out, p.x);
    out.push(' ');
    fmt_num(out, p.y);
}

/// Serialise subpaths as absolute path data.
pub fn to_path_data(subpaths: &[SubPath]) -> String {
    let mut out = String::new();
    for sp in subpaths {
        for cmd in &sp.commands {
            if !out.is_empty() {
                out.push(' ');
            }
            match *cmd {
                Command::MoveTo { x, y } => { out.push_str("M "); push_point(&mut out, Vec2::new(x, y)); }
                Command::LineTo { x, y } => { out.push_str("L "); push_point(&mut out, Vec2::new(x, y)); }
                Command::CurveTo { x1, y1, x2, y2, x, y } => {
                    out.push_str("C ");
                    push_point(&mut out, Vec2::new(x1, y1));
                    out.push(' ');
                    push_point(&mut out, Vec2::new(x2, y2));
                    out.push(' ');
                    push_point(&mut out, Vec2::new(x, y));
                }
                Command::Close => out.push('Z'),
            }
        }
    }
    out
}

/// Commands drawing a run of connected curves, starting with a move-to.
///
/// With `closed`, a trailing line that returns to the start is folded into
/// the `Close` command that draws the same edge.
pub fn curves_to_subpath(curves: &[Curve], closed: bool) -> SubPath {
    let mut commands = Vec::with_capacity(curves.len() + 2);
    let Some(first) = curves.first() else { return SubPath::default(); };
    let start = first.start();
    commands.push(Command::MoveTo { x: start.x, y: start.y });
    let mut body = curves;
    if closed && body.len() > 1 {
        if let Some(Curve::Line { to, .. }) = body.last() {
            if *to == start {
                body = &body[..body.len() - 1];
            }
        }
    }
    for c in body {
        commands.push(match *c {
            Curve::Line { to, .. } => Command::LineTo { x: to.x, y: to.y },
            Curve::Cubic { c1, c2, to, .. } => Command::CurveTo { x1: c1.x, y1: c1.y, x2: c2.x, y2: c2.y, x: to.x, y: to.y },
        });
    }
    if closed {
        commands.push(Command::Close);
    }
    SubPath { commands }
}

pub fn curves_to_path_data(curves: &[Curve], closed: bool) -> String {
    to_path_data(&[curves_to_subpath(curves, closed)])
}
