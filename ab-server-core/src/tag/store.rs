//! Typed byte storage keyed by name (CIP) or data-file number (PCCC) —
//! `spec.md` §4.2.

use std::collections::HashMap;
use std::sync::Mutex;

use super::types::{CipType, PcccType};

#[derive(Debug)]
pub struct ShortTag {
    pub needed: usize,
    pub available: usize,
}

/// A named or numbered typed data object. One `Mutex` per tag guards its
/// byte buffer; there is no store-wide lock because the tag set is
/// immutable after startup (`spec.md` §4.2).
pub struct Tag {
    pub name: String,
    pub cip_type: CipType,
    pub pccc_type: Option<PcccType>,
    pub dims: [u32; 3],
    pub elem_count: u32,
    pub elem_size: usize,
    pub data_file_num: Option<u16>,
    data: Mutex<Vec<u8>>,
}

impl Tag {
    /// Builds a CIP tag, applying the ControlLogix `BOOL[n>1]` rewrite to a
    /// 32-bit bit string with `ceil(n/32)` elements (`spec.md` §3, invariant
    /// 9 of `spec.md` §8). `is_control_logix` selects the family this
    /// rewrite is scoped to.
    pub fn new_cip(name: String, declared_type: CipType, dims: [u32; 3], is_control_logix: bool) -> Self {
        let declared_count: u32 = dims.iter().product();
        let (cip_type, elem_count) = if is_control_logix && declared_type == CipType::Bool && declared_count > 1 {
            (CipType::BitString32, declared_count.div_ceil(32))
        } else {
            (declared_type, declared_count)
        };
        let elem_size = cip_type.elem_size();
        let data = vec![0u8; elem_size * elem_count as usize];
        Self {
            name,
            cip_type,
            pccc_type: None,
            dims,
            elem_count,
            elem_size,
            data_file_num: None,
            data: Mutex::new(data),
        }
    }

    pub fn new_pccc(data_file_num: u16, pccc_type: PcccType, elem_count: u32) -> Self {
        let elem_size = pccc_type.elem_size();
        let data = vec![0u8; elem_size * elem_count as usize];
        Self {
            name: String::new(),
            cip_type: match pccc_type {
                PcccType::Int => CipType::Int,
                PcccType::Dint => CipType::Dint,
                PcccType::Real => CipType::Real,
                PcccType::String => CipType::String,
            },
            pccc_type: Some(pccc_type),
            dims: [elem_count, 1, 1],
            elem_count,
            elem_size,
            data_file_num: Some(data_file_num),
            data: Mutex::new(data),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.elem_size * self.elem_count as usize
    }

    pub fn num_dimensions(&self) -> usize {
        // dims beyond the first non-unit-trailing slot count as real
        // dimensions; a tag declared with dims=[10,1,1] is 1-dimensional.
        if self.dims[2] != 1 {
            3
        } else if self.dims[1] != 1 {
            2
        } else {
            1
        }
    }

    pub fn read(&self, offset: usize, len: usize) -> Result<Vec<u8>, ShortTag> {
        let guard = self.data.lock().expect("tag mutex poisoned");
        if offset.saturating_add(len) > guard.len() {
            return Err(ShortTag {
                needed: offset + len,
                available: guard.len(),
            });
        }
        Ok(guard[offset..offset + len].to_vec())
    }

    pub fn write(&self, offset: usize, bytes: &[u8]) -> Result<(), ShortTag> {
        let mut guard = self.data.lock().expect("tag mutex poisoned");
        if offset.saturating_add(bytes.len()) > guard.len() {
            return Err(ShortTag {
                needed: offset + bytes.len(),
                available: guard.len(),
            });
        }
        guard[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// An unordered collection of tags, built once at startup from the CLI's
/// tag specs and immutable thereafter (`spec.md` §3).
pub struct TagStore {
    by_name: HashMap<String, Tag>,
    by_data_file: HashMap<u16, Tag>,
}

impl TagStore {
    pub fn new(cip_tags: Vec<Tag>, pccc_tags: Vec<Tag>) -> Self {
        let mut by_name = HashMap::new();
        for tag in cip_tags {
            by_name.insert(tag.name.clone(), tag);
        }
        let mut by_data_file = HashMap::new();
        for tag in pccc_tags {
            if let Some(num) = tag.data_file_num {
                by_data_file.insert(num, tag);
            }
        }
        Self { by_name, by_data_file }
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Tag> {
        self.by_name.get(name)
    }

    pub fn find_by_data_file(&self, num: u16) -> Option<&Tag> {
        self.by_data_file.get(&num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_after_write_returns_the_bytes_just_written() {
        let tag = Tag::new_cip("MyTag".into(), CipType::Dint, [10, 1, 1], false);
        tag.write(12, &[0xEF, 0xBE, 0xAD, 0xDE]).unwrap();
        assert_eq!(tag.read(12, 4).unwrap(), vec![0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn control_logix_bool_array_rewrites_to_bitstring32() {
        let tag = Tag::new_cip("b".into(), CipType::Bool, [100, 1, 1], true);
        assert_eq!(tag.cip_type, CipType::BitString32);
        assert_eq!(tag.elem_count, 4);
        assert_eq!(tag.byte_len(), 16);
    }

    #[test]
    fn non_control_logix_bool_array_is_not_rewritten() {
        let tag = Tag::new_cip("b".into(), CipType::Bool, [100, 1, 1], false);
        assert_eq!(tag.cip_type, CipType::Bool);
        assert_eq!(tag.elem_count, 100);
    }

    #[test]
    fn single_bool_is_never_rewritten_even_on_control_logix() {
        let tag = Tag::new_cip("b".into(), CipType::Bool, [1, 1, 1], true);
        assert_eq!(tag.cip_type, CipType::Bool);
        assert_eq!(tag.elem_count, 1);
    }

    #[test]
    fn write_out_of_bounds_is_rejected() {
        let tag = Tag::new_cip("x".into(), CipType::Sint, [4, 1, 1], false);
        assert!(tag.write(3, &[1, 2]).is_err());
    }
}
