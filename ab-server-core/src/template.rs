//! The "template connection": the configuration a CLI builds and every
//! accepted TCP connection is stamped from — `spec.md` §3, §6.
//!
//! Parsing `--tag=` strings is part of the CLI's job per `spec.md` §1
//! ("out of scope: command-line argument parsing"), but the *shape* of a
//! tag spec is part of the external interface the core exposes, so the
//! parsers live here rather than in the `ab-server` binary.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, SimError};
use crate::family::PlcFamily;
use crate::tag::{CipType, PcccType, Tag, TagStore};

#[derive(Clone)]
pub struct TemplateConnection {
    pub family: PlcFamily,
    pub path: Option<(u8, u8)>,
    pub port: u16,
    pub reject_fo_count: u32,
    pub delay: Duration,
    pub tags: Arc<TagStore>,
}

impl TemplateConnection {
    pub fn expected_epath(&self) -> Vec<u8> {
        self.family.expected_epath(self.path)
    }

    pub fn max_packet(&self) -> u16 {
        self.family.max_packet()
    }
}

/// Parses one `--tag=` value. Dispatches to the CIP or PCCC grammar
/// depending on the family, matching `process_tag_args` in
/// `original_source`.
pub fn parse_tag_spec(spec: &str, family: PlcFamily) -> Result<Tag> {
    if family.is_pccc() {
        parse_pccc_tag(spec)
    } else {
        parse_cip_tag(spec, family)
    }
}

/// `name:TYPE[d0(,d1(,d2))]` — name starts with a letter, 1-3 positive
/// dimensions, `TYPE` one of the CIP type names in `spec.md` §6.
fn parse_cip_tag(spec: &str, family: PlcFamily) -> Result<Tag> {
    let (name, rest) = spec
        .split_once(':')
        .ok_or_else(|| SimError::Config(format!("tag spec \"{spec}\" is missing ':TYPE'")))?;

    if name.is_empty() || !name.chars().next().unwrap().is_ascii_alphabetic() {
        return Err(SimError::Config(format!(
            "tag name \"{name}\" must start with a letter"
        )));
    }
    if !(1..=40).contains(&name.len()) {
        return Err(SimError::Config(format!(
            "tag name \"{name}\" must be 1-40 characters"
        )));
    }

    let bracket = rest
        .find('[')
        .ok_or_else(|| SimError::Config(format!("tag spec \"{spec}\" is missing dimensions")))?;
    let (type_name, dims_part) = rest.split_at(bracket);
    let dims_part = dims_part
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| SimError::Config(format!("tag spec \"{spec}\" has malformed dimensions")))?;

    let cip_type = CipType::from_name(type_name)
        .ok_or_else(|| SimError::Config(format!("unknown CIP type \"{type_name}\"")))?;

    let mut dims = [1u32, 1, 1];
    let parts: Vec<&str> = dims_part.split(',').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(SimError::Config(format!(
            "tag spec \"{spec}\" must have 1-3 dimensions"
        )));
    }
    for (slot, part) in dims.iter_mut().zip(parts.iter()) {
        let n: u32 = part
            .trim()
            .parse()
            .map_err(|_| SimError::Config(format!("dimension \"{part}\" is not a positive integer")))?;
        if n == 0 {
            return Err(SimError::Config("dimensions must be positive".into()));
        }
        *slot = n;
    }

    Ok(Tag::new_cip(name.to_string(), cip_type, dims, family.is_control_logix()))
}

/// `FILE[size]`, `FILE` in `{N7, F8, ST18, L19}`.
fn parse_pccc_tag(spec: &str) -> Result<Tag> {
    let bracket = spec
        .find('[')
        .ok_or_else(|| SimError::Config(format!("PCCC tag spec \"{spec}\" is missing [size]")))?;
    let (file_name, size_part) = spec.split_at(bracket);
    let size_part = size_part
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| SimError::Config(format!("PCCC tag spec \"{spec}\" has malformed size")))?;

    let (pccc_type, data_file_num) = PcccType::from_file_name(file_name)
        .ok_or_else(|| SimError::Config(format!("unknown PCCC data file \"{file_name}\"")))?;

    let elem_count: u32 = size_part
        .trim()
        .parse()
        .map_err(|_| SimError::Config(format!("PCCC tag size \"{size_part}\" is not a positive integer")))?;
    if elem_count == 0 {
        return Err(SimError::Config("PCCC tag size must be positive".into()));
    }

    Ok(Tag::new_pccc(data_file_num, pccc_type, elem_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_cip_tag() {
        let tag = parse_cip_tag("MyTag:DINT[10]", PlcFamily::ControlLogix).unwrap();
        assert_eq!(tag.name, "MyTag");
        assert_eq!(tag.cip_type, CipType::Dint);
        assert_eq!(tag.elem_count, 10);
    }

    #[test]
    fn parses_a_multidimensional_cip_tag() {
        let tag = parse_cip_tag("Grid:INT[2,3]", PlcFamily::Micro800).unwrap();
        assert_eq!(tag.dims, [2, 3, 1]);
        assert_eq!(tag.elem_count, 6);
    }

    #[test]
    fn rejects_tag_name_starting_with_digit() {
        assert!(parse_cip_tag("1Tag:DINT[1]", PlcFamily::ControlLogix).is_err());
    }

    #[test]
    fn control_logix_bool_array_rewrite_applies_through_template_parsing() {
        let tag = parse_cip_tag("b:BOOL[100]", PlcFamily::ControlLogix).unwrap();
        assert_eq!(tag.cip_type, CipType::BitString32);
        assert_eq!(tag.elem_count, 4);
    }

    #[test]
    fn parses_pccc_tag_specs() {
        let tag = parse_pccc_tag("N7[10]").unwrap();
        assert_eq!(tag.data_file_num, Some(7));
        assert_eq!(tag.elem_count, 10);
        assert_eq!(tag.elem_size, 2);
    }

    #[test]
    fn rejects_unknown_pccc_file() {
        assert!(parse_pccc_tag("N9[10]").is_err());
    }
}
