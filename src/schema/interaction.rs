//! Bonded-interaction parameters whose arity depends on a function type code.

use std::fmt;

use super::error::RecordError;
use super::fields::Fields;

/// Parameter names per function type for one section.
#[derive(Debug)]
pub struct FunctionTable {
    pub section: &'static str,
    entries: &'static [(u8, &'static [&'static str])],
}

impl FunctionTable {
    const fn new(section: &'static str, entries: &'static [(u8, &'static [&'static str])]) -> Self {
        Self { section, entries }
    }

    /// Parameter names for `func`, if the function type exists here.
    pub fn params(&self, func: u8) -> Option<&'static [&'static str]> {
        self.entries
            .iter()
            .find(|(code, _)| *code == func)
            .map(|(_, names)| *names)
    }

    /// How many parameters of `func` have a B-state counterpart.
    /// Multiplicities and table numbers do not.
    pub fn perturbable(&self, func: u8) -> usize {
        self.params(func).map_or(0, |names| {
            names
                .iter()
                .filter(|name| !matches!(**name, "mult" | "table"))
                .count()
        })
    }
}

pub static BONDS: FunctionTable = FunctionTable::new(
    "bonds",
    &[
        (1, &["b0", "kb"]),
        (2, &["b0", "kb"]),
        (3, &["b0", "D", "beta"]),
        (4, &["b0", "C", "i"]),
        (5, &[]),
        (6, &["b0", "kb"]),
        (7, &["bm", "kb"]),
        (8, &["table", "k"]),
        (9, &["table", "k"]),
        (10, &["low", "up1", "up2", "k"]),
    ],
);

pub static PAIRS: FunctionTable = FunctionTable::new(
    "pairs",
    &[(1, &["V", "W"]), (2, &["fudgeQQ", "qi", "qj", "V", "W"])],
);

pub static NONBOND: FunctionTable =
    FunctionTable::new("nonbond_params", &[(1, &["V", "W"]), (2, &["a", "b", "c"])]);

pub static ANGLES: FunctionTable = FunctionTable::new(
    "angles",
    &[
        (1, &["theta", "k"]),
        (2, &["theta", "k"]),
        (3, &["r1e", "r2e", "krr"]),
        (4, &["theta", "r1e", "r2e", "krt"]),
        (5, &["theta", "k", "ub0", "kub"]),
        (8, &["table", "k"]),
        (10, &["theta", "k"]),
    ],
);

pub static DIHEDRALS: FunctionTable = FunctionTable::new(
    "dihedrals",
    &[
        (1, &["phi", "k", "mult"]),
        (2, &["xi", "k"]),
        (3, &["c0", "c1", "c2", "c3", "c4", "c5"]),
        (4, &["phi", "k", "mult"]),
        (5, &["c1", "c2", "c3", "c4"]),
        (8, &["table", "k"]),
        (9, &["phi", "k", "mult"]),
        (10, &["phi", "k"]),
        (11, &["a0", "a1", "a2", "a3"]),
    ],
);

pub static CONSTRAINTS: FunctionTable =
    FunctionTable::new("constraints", &[(1, &["b0"]), (2, &["b0"])]);

pub static POSITION_RESTRAINTS: FunctionTable = FunctionTable::new(
    "position_restraints",
    &[(1, &["fcx", "fcy", "fcz"]), (2, &["g", "r", "k"])],
);

/// Function type code plus its parameters.
///
/// An empty `params` means the parameters are looked up from the force
/// field's type tables. `b_state` holds the optional free-energy B-state
/// values written after the A-state ones.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interaction {
    pub func: u8,
    pub params: Vec<f64>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub b_state: Vec<f64>,
}

impl Interaction {
    pub fn new(func: u8, params: Vec<f64>) -> Self {
        Self {
            func,
            params,
            b_state: Vec::new(),
        }
    }

    pub fn with_b_state(mut self, b_state: Vec<f64>) -> Self {
        self.b_state = b_state;
        self
    }

    /// Read the function code, then exactly the parameters `table` lists for
    /// it. With `may_omit`, a line that ends right after the code is
    /// accepted with no parameters.
    pub fn parse(fields: &mut Fields<'_>, table: &FunctionTable, may_omit: bool) -> Result<Self, RecordError> {
        let func: u8 = fields.required("func")?;
        let names = table.params(func).ok_or(RecordError::UnknownFunction {
            section: table.section,
            func,
        })?;
        if may_omit && fields.remaining() == 0 {
            return Ok(Self::new(func, Vec::new()));
        }
        let mut params: Vec<f64> = Vec::with_capacity(names.len());
        for &name in names {
            params.push(fields.required(name)?);
        }
        let perturbable = table.perturbable(func);
        let b_state = if perturbable > 0 && fields.remaining() == perturbable {
            fields.rest("B-state parameter")?
        } else {
            Vec::new()
        };
        fields.finish()?;
        Ok(Self::new(func, params).with_b_state(b_state))
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5}", self.func)?;
        for p in self.params.iter().chain(&self.b_state) {
            write!(f, " {:>12}", p)?;
        }
        Ok(())
    }
}
