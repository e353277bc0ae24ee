//! Records of the molecule-type sections.

use std::fmt;

use smol_str::SmolStr;

use super::error::RecordError;
use super::fields::Fields;
use super::interaction::{self, Interaction};

/// `[ moleculetype ]`: opens a new molecule type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoleculeTypeHeader {
    pub name: SmolStr,
    /// Number of bonds within which non-bonded interactions are excluded.
    pub nrexcl: u32,
}

impl MoleculeTypeHeader {
    pub fn parse(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Ok(Self {
            name: fields.required("name")?,
            nrexcl: fields.required("nrexcl")?,
        })
    }
}

impl fmt::Display for MoleculeTypeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<10} {:>3}", self.name, self.nrexcl)
    }
}

/// `[ atoms ]`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Atom {
    pub id: u32,
    pub atom_type: SmolStr,
    pub resnr: i32,
    pub residue: SmolStr,
    pub name: SmolStr,
    pub cgnr: u32,
    pub charge: f64,
    /// `None` when the mass comes from the atom type.
    pub mass: Option<f64>,
    /// Free-energy B state, written after the mass.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub b_state: Option<AtomStateB>,
}

/// The `typeB chargeB massB` columns of an `[ atoms ]` line. Missing
/// charge and mass default to those of the B type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtomStateB {
    pub atom_type: SmolStr,
    pub charge: Option<f64>,
    pub mass: Option<f64>,
}

impl Atom {
    pub fn parse(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        let mut atom = Self {
            id: fields.required("id")?,
            atom_type: fields.required("type")?,
            resnr: fields.required("resnr")?,
            residue: fields.required("residue")?,
            name: fields.required("atom")?,
            cgnr: fields.required("cgnr")?,
            charge: fields.required("charge")?,
            mass: fields.optional("mass")?,
            b_state: None,
        };
        if let Some(atom_type) = fields.optional("typeB")? {
            let charge = fields.optional("chargeB")?;
            let mass = match charge {
                Some(_) => fields.optional("massB")?,
                None => None,
            };
            atom.b_state = Some(AtomStateB {
                atom_type,
                charge,
                mass,
            });
        }
        Ok(atom)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>5} {:<6} {:>5} {:<5} {:<5} {:>5} {:>10}",
            self.id, self.atom_type, self.resnr, self.residue, self.name, self.cgnr, self.charge
        )?;
        if let Some(mass) = self.mass {
            write!(f, " {mass:>10}")?;
        }
        if let Some(b) = &self.b_state {
            write!(f, " {:<6}", b.atom_type)?;
            if let Some(charge) = b.charge {
                write!(f, " {charge:>10}")?;
            }
            if let Some(mass) = b.mass {
                write!(f, " {mass:>10}")?;
            }
        }
        Ok(())
    }
}

/// Two-atom bonded line: `[ bonds ]`, `[ pairs ]` and `[ constraints ]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    pub ai: u32,
    pub aj: u32,
    pub interaction: Interaction,
}

impl Link {
    pub fn parse_bond(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Self::parse(fields, &interaction::BONDS)
    }

    pub fn parse_pair(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Self::parse(fields, &interaction::PAIRS)
    }

    pub fn parse_constraint(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Self::parse(fields, &interaction::CONSTRAINTS)
    }

    fn parse(fields: &mut Fields<'_>, table: &interaction::FunctionTable) -> Result<Self, RecordError> {
        Ok(Self {
            ai: fields.required("ai")?,
            aj: fields.required("aj")?,
            interaction: Interaction::parse(fields, table, true)?,
        })
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5} {:>5} {}", self.ai, self.aj, self.interaction)
    }
}

/// `[ angles ]`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Angle {
    pub ai: u32,
    pub aj: u32,
    pub ak: u32,
    pub interaction: Interaction,
}

impl Angle {
    pub fn parse(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Ok(Self {
            ai: fields.required("ai")?,
            aj: fields.required("aj")?,
            ak: fields.required("ak")?,
            interaction: Interaction::parse(fields, &interaction::ANGLES, true)?,
        })
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5} {:>5} {:>5} {}", self.ai, self.aj, self.ak, self.interaction)
    }
}

/// `[ dihedrals ]`, proper and improper alike.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dihedral {
    pub ai: u32,
    pub aj: u32,
    pub ak: u32,
    pub al: u32,
    pub interaction: Interaction,
}

impl Dihedral {
    pub fn parse(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Ok(Self {
            ai: fields.required("ai")?,
            aj: fields.required("aj")?,
            ak: fields.required("ak")?,
            al: fields.required("al")?,
            interaction: Interaction::parse(fields, &interaction::DIHEDRALS, true)?,
        })
    }
}

impl fmt::Display for Dihedral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>5} {:>5} {:>5} {:>5} {}",
            self.ai, self.aj, self.ak, self.al, self.interaction
        )
    }
}

/// `[ exclusions ]`: the first atom excludes every atom after it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Exclusion {
    pub atom: u32,
    pub excluded: Vec<u32>,
}

impl Exclusion {
    pub fn parse(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        let atom = fields.required("ai")?;
        let first = fields.required("aj")?;
        let mut excluded = vec![first];
        excluded.extend(fields.rest::<u32>("aj")?);
        Ok(Self { atom, excluded })
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5}", self.atom)?;
        for a in &self.excluded {
            write!(f, " {a:>5}")?;
        }
        Ok(())
    }
}

/// `[ settles ]` for rigid three-site water.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settle {
    pub ow: u32,
    pub func: u8,
    pub doh: f64,
    pub dhh: f64,
}

impl Settle {
    pub fn parse(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Ok(Self {
            ow: fields.required("ow")?,
            func: fields.required("func")?,
            doh: fields.required("doh")?,
            dhh: fields.required("dhh")?,
        })
    }
}

impl fmt::Display for Settle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5} {:>5} {} {}", self.ow, self.func, self.doh, self.dhh)
    }
}

/// `[ position_restraints ]`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionRestraint {
    pub ai: u32,
    pub interaction: Interaction,
}

impl PositionRestraint {
    pub fn parse(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Ok(Self {
            ai: fields.required("ai")?,
            interaction: Interaction::parse(fields, &interaction::POSITION_RESTRAINTS, true)?,
        })
    }
}

impl fmt::Display for PositionRestraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5} {}", self.ai, self.interaction)
    }
}
