//! Records of the force-field sections.

use std::fmt;

use smol_str::SmolStr;

use super::error::RecordError;
use super::fields::{Field, Fields};
use super::interaction::{self, Interaction};

/// `[ defaults ]`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Defaults {
    pub nbfunc: u8,
    pub comb_rule: u8,
    pub gen_pairs: Option<bool>,
    pub fudge_lj: Option<f64>,
    pub fudge_qq: Option<f64>,
}

impl Defaults {
    pub fn parse(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Ok(Self {
            nbfunc: fields.required("nbfunc")?,
            comb_rule: fields.required("comb-rule")?,
            gen_pairs: fields.optional("gen-pairs")?,
            fudge_lj: fields.optional("fudgeLJ")?,
            fudge_qq: fields.optional("fudgeQQ")?,
        })
    }
}

impl fmt::Display for Defaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5} {:>5}", self.nbfunc, self.comb_rule)?;
        if let Some(gen_pairs) = self.gen_pairs {
            write!(f, " {:>5}", if gen_pairs { "yes" } else { "no" })?;
        }
        if let Some(v) = self.fudge_lj {
            write!(f, " {v}")?;
        }
        if let Some(v) = self.fudge_qq {
            write!(f, " {v}")?;
        }
        Ok(())
    }
}

/// Particle type column of `[ atomtypes ]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParticleType {
    Atom,
    Shell,
    VirtualSite,
    Dummy,
    Bond,
}

impl ParticleType {
    pub fn code(self) -> char {
        match self {
            ParticleType::Atom => 'A',
            ParticleType::Shell => 'S',
            ParticleType::VirtualSite => 'V',
            ParticleType::Dummy => 'D',
            ParticleType::Bond => 'B',
        }
    }
}

impl Field for ParticleType {
    const EXPECTED: &'static str = "a particle type (A, S, V, D or B)";

    fn validate(token: &str) -> Option<Self> {
        match token {
            "A" => Some(ParticleType::Atom),
            "S" => Some(ParticleType::Shell),
            "V" => Some(ParticleType::VirtualSite),
            "D" => Some(ParticleType::Dummy),
            "B" => Some(ParticleType::Bond),
            _ => None,
        }
    }
}

impl fmt::Display for ParticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// `[ atomtypes ]`
///
/// The column holding the particle type tells the layouts apart:
///
/// ```text
/// name                    mass charge ptype sigma epsilon
/// name           at.num   mass charge ptype sigma epsilon
/// name bond_type          mass charge ptype sigma epsilon
/// name bond_type at.num   mass charge ptype sigma epsilon
/// ```
///
/// Columns a layout lacks are `None`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtomType {
    pub name: SmolStr,
    pub bond_type: Option<SmolStr>,
    pub atomic_number: Option<u32>,
    pub mass: f64,
    pub charge: f64,
    pub particle_type: ParticleType,
    pub sigma: f64,
    pub epsilon: f64,
}

impl AtomType {
    pub fn parse(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        let is_ptype = |offset| fields.peek_at(offset).and_then(ParticleType::validate).is_some();
        let (has_bond_type, has_atomic_number) = if is_ptype(5) {
            (true, true)
        } else if is_ptype(4) {
            let second_is_number = fields.peek_at(1).and_then(u32::validate).is_some();
            (!second_is_number, second_is_number)
        } else {
            (false, false)
        };
        let name = fields.required("name")?;
        let bond_type = if has_bond_type {
            Some(fields.required("bond_type")?)
        } else {
            None
        };
        let atomic_number = if has_atomic_number {
            Some(fields.required("at.num")?)
        } else {
            None
        };
        Ok(Self {
            name,
            bond_type,
            atomic_number,
            mass: fields.required("mass")?,
            charge: fields.required("charge")?,
            particle_type: fields.required("ptype")?,
            sigma: fields.required("sigma")?,
            epsilon: fields.required("epsilon")?,
        })
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8}", self.name)?;
        if let Some(bond_type) = &self.bond_type {
            write!(f, " {bond_type:<6}")?;
        }
        if let Some(z) = self.atomic_number {
            write!(f, " {z:>4}")?;
        }
        write!(
            f,
            " {:>10} {:>10} {} {:>12} {:>12}",
            self.mass, self.charge, self.particle_type, self.sigma, self.epsilon
        )
    }
}

/// Two-type parameter line: `[ nonbond_params ]`, `[ pairtypes ]`,
/// `[ bondtypes ]` and `[ constrainttypes ]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairTypeParams {
    pub ai: SmolStr,
    pub aj: SmolStr,
    pub interaction: Interaction,
}

impl PairTypeParams {
    pub fn parse_nonbond(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Self::parse(fields, &interaction::NONBOND)
    }

    pub fn parse_pairtype(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Self::parse(fields, &interaction::PAIRS)
    }

    pub fn parse_bondtype(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Self::parse(fields, &interaction::BONDS)
    }

    pub fn parse_constrainttype(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Self::parse(fields, &interaction::CONSTRAINTS)
    }

    fn parse(fields: &mut Fields<'_>, table: &interaction::FunctionTable) -> Result<Self, RecordError> {
        Ok(Self {
            ai: fields.required("ai")?,
            aj: fields.required("aj")?,
            interaction: Interaction::parse(fields, table, false)?,
        })
    }
}

impl fmt::Display for PairTypeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<6} {:<6} {}", self.ai, self.aj, self.interaction)
    }
}

/// `[ angletypes ]`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AngleTypeParams {
    pub ai: SmolStr,
    pub aj: SmolStr,
    pub ak: SmolStr,
    pub interaction: Interaction,
}

impl AngleTypeParams {
    pub fn parse(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Ok(Self {
            ai: fields.required("ai")?,
            aj: fields.required("aj")?,
            ak: fields.required("ak")?,
            interaction: Interaction::parse(fields, &interaction::ANGLES, false)?,
        })
    }
}

impl fmt::Display for AngleTypeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<6} {:<6} {:<6} {}", self.ai, self.aj, self.ak, self.interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atomtype(line: &str) -> Result<AtomType, RecordError> {
        let mut fields = Fields::new(line);
        let record = AtomType::parse(&mut fields)?;
        fields.finish()?;
        Ok(record)
    }

    #[test]
    fn test_atomtype_without_atomic_number() {
        let p5 = atomtype("P5 72.0 0.000 A 0.0 0.0").unwrap();
        assert_eq!(p5.name, "P5");
        assert_eq!(p5.mass, 72.0);
        assert_eq!(p5.charge, 0.0);
        assert_eq!(p5.particle_type, ParticleType::Atom);
        assert_eq!(p5.sigma, 0.0);
        assert_eq!(p5.epsilon, 0.0);
        assert_eq!(p5.atomic_number, None);
        assert_eq!(p5.bond_type, None);
    }

    #[test]
    fn test_atomtype_with_atomic_number_and_bond_type() {
        let ow = atomtype("OW 8 15.9994 -0.834 A 3.15061e-01 6.36386e-01").unwrap();
        assert_eq!(ow.atomic_number, Some(8));
        assert_eq!(ow.charge, -0.834);

        let ct = atomtype("opls_135 CT 6 12.011 -0.18 A 3.5e-01 2.76144e-01").unwrap();
        assert_eq!(ct.bond_type.as_deref(), Some("CT"));
        assert_eq!(ct.atomic_number, Some(6));
    }

    #[test]
    fn test_atomtype_bond_type_without_atomic_number() {
        let hw = atomtype("HW_tip3p HW 1.008 0.417 A 0.0 0.0").unwrap();
        assert_eq!(hw.bond_type.as_deref(), Some("HW"));
        assert_eq!(hw.atomic_number, None);
        assert_eq!(hw.mass, 1.008);
    }

    #[test]
    fn test_atomtype_bad_ptype() {
        assert_eq!(
            atomtype("P5 72.0 0.000 X 0.0 0.0"),
            Err(RecordError::invalid(
                "ptype",
                "X",
                "a particle type (A, S, V, D or B)"
            ))
        );
    }

    #[test]
    fn test_atomtype_too_short_names_first_missing_field() {
        assert_eq!(
            atomtype("P5 72.0 0.000 A"),
            Err(RecordError::MissingField { field: "sigma" })
        );
    }

    #[test]
    fn test_atomtype_too_long_is_extra_data() {
        assert_eq!(
            atomtype("opls_135 CT 6 12.011 -0.18 A 0.35 0.27 junk"),
            Err(RecordError::ExtraData("junk".to_string()))
        );
    }

    #[test]
    fn test_defaults_optional_columns() {
        let mut fields = Fields::new("1 1");
        let defaults = Defaults::parse(&mut fields).unwrap();
        assert_eq!(defaults.gen_pairs, None);

        let mut fields = Fields::new("1 2 yes 0.5 0.8333");
        let defaults = Defaults::parse(&mut fields).unwrap();
        assert_eq!(defaults.gen_pairs, Some(true));
        assert_eq!(defaults.fudge_qq, Some(0.8333));
    }

    #[test]
    fn test_nonbond_params() {
        let mut fields = Fields::new("P5 Qa 1 0.21558E-00 0.23238E-02");
        let nb = PairTypeParams::parse_nonbond(&mut fields).unwrap();
        assert_eq!(nb.ai, "P5");
        assert_eq!(nb.aj, "Qa");
        assert_eq!(nb.interaction.params, vec![0.21558, 0.0023238]);
    }
}
