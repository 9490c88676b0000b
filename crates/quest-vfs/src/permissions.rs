//! Permission bits and chmod mode specifications.
//!
//! Permissions are stored only as bits, so the octal and symbolic views
//! are always derived from the same value and cannot drift apart.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use quest_types::{QuestError, Result};

bitflags! {
    /// Capability set for one permission class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Access: u8 {
        const READ = 0b100;
        const WRITE = 0b010;
        const EXEC = 0b001;
    }
}

bitflags! {
    /// Permission classes a symbolic clause applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Targets: u8 {
        const USER = 0b100;
        const GROUP = 0b010;
        const OTHER = 0b001;
    }
}

impl Access {
    /// Three-character `rwx` form, `-` for absent bits.
    pub fn symbolic(self) -> String {
        let mut s = String::with_capacity(3);
        s.push(if self.contains(Self::READ) { 'r' } else { '-' });
        s.push(if self.contains(Self::WRITE) { 'w' } else { '-' });
        s.push(if self.contains(Self::EXEC) { 'x' } else { '-' });
        s
    }

    fn from_digit(c: char) -> Option<Self> {
        let d = c.to_digit(8)?;
        Self::from_bits(d as u8)
    }
}

/// Owner, group and other capability sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permissions {
    pub owner: Access,
    pub group: Access,
    pub other: Access,
}

impl Permissions {
    /// `rw-r--r--`, the mode given to new files.
    pub const FILE_DEFAULT: Self = Self {
        owner: Access::READ.union(Access::WRITE),
        group: Access::READ,
        other: Access::READ,
    };

    /// `rwxr-xr-x`, the mode given to new directories.
    pub const DIR_DEFAULT: Self = Self {
        owner: Access::all(),
        group: Access::READ.union(Access::EXEC),
        other: Access::READ.union(Access::EXEC),
    };

    /// Parse exactly three octal digits, e.g. `"644"`.
    pub fn from_octal(s: &str) -> Result<Self> {
        let digits: Option<Vec<Access>> = s.chars().map(Access::from_digit).collect();
        match digits.as_deref() {
            Some([owner, group, other]) => Ok(Self {
                owner: *owner,
                group: *group,
                other: *other,
            }),
            _ => Err(QuestError::InvalidArgument(format!("invalid mode: '{s}'"))),
        }
    }

    /// Three-digit octal form, e.g. `"755"`.
    pub fn octal(&self) -> String {
        format!(
            "{}{}{}",
            self.owner.bits(),
            self.group.bits(),
            self.other.bits()
        )
    }

    /// Nine-character symbolic form, e.g. `"rwxr-xr-x"`.
    pub fn symbolic(&self) -> String {
        format!(
            "{}{}{}",
            self.owner.symbolic(),
            self.group.symbolic(),
            self.other.symbolic()
        )
    }

    /// Return the permissions that result from applying `spec`.
    pub fn apply(&self, spec: &ModeSpec) -> Self {
        match spec {
            ModeSpec::Octal(p) => *p,
            ModeSpec::Symbolic(clauses) => {
                let mut next = *self;
                for clause in clauses {
                    for (target, slot) in [
                        (Targets::USER, &mut next.owner),
                        (Targets::GROUP, &mut next.group),
                        (Targets::OTHER, &mut next.other),
                    ] {
                        if !clause.targets.contains(target) {
                            continue;
                        }
                        *slot = match clause.op {
                            ModeOp::Add => *slot | clause.bits,
                            ModeOp::Remove => *slot - clause.bits,
                            ModeOp::Assign => clause.bits,
                        };
                    }
                }
                next
            },
        }
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbolic())
    }
}

/// Symbolic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeOp {
    /// `+`
    Add,
    /// `-`
    Remove,
    /// `=`
    Assign,
}

/// One symbolic clause such as `u+x` or `go=r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolicClause {
    pub targets: Targets,
    pub op: ModeOp,
    pub bits: Access,
}

impl FromStr for SymbolicClause {
    type Err = QuestError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || QuestError::InvalidArgument(format!("invalid mode: '{s}'"));
        let op_pos = s.find(['+', '-', '=']).ok_or_else(invalid)?;
        let (who, rest) = s.split_at(op_pos);
        let op = match &rest[..1] {
            "+" => ModeOp::Add,
            "-" => ModeOp::Remove,
            _ => ModeOp::Assign,
        };

        let mut targets = Targets::empty();
        for c in who.chars() {
            targets |= match c {
                'u' => Targets::USER,
                'g' => Targets::GROUP,
                'o' => Targets::OTHER,
                'a' => Targets::all(),
                _ => return Err(invalid()),
            };
        }
        if targets.is_empty() {
            targets = Targets::all();
        }

        let mut bits = Access::empty();
        for c in rest[1..].chars() {
            bits |= match c {
                'r' => Access::READ,
                'w' => Access::WRITE,
                'x' => Access::EXEC,
                _ => return Err(invalid()),
            };
        }
        if bits.is_empty() && op != ModeOp::Assign {
            return Err(invalid());
        }

        Ok(Self { targets, op, bits })
    }
}

/// A parsed chmod mode argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeSpec {
    /// Absolute mode such as `755`.
    Octal(Permissions),
    /// Comma-separated symbolic clauses such as `u+x,g-w`.
    Symbolic(Vec<SymbolicClause>),
}

impl FromStr for ModeSpec {
    type Err = QuestError;

    fn from_str(s: &str) -> Result<Self> {
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            return Permissions::from_octal(s).map(Self::Octal);
        }
        let clauses = s
            .split(',')
            .map(SymbolicClause::from_str)
            .collect::<Result<Vec<SymbolicClause>>>()?;
        Ok(Self::Symbolic(clauses))
    }
}
