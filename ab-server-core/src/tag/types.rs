//! CIP and PCCC tag data-type tables — `SPEC_FULL.md` §3, `spec.md` §6.

/// A CIP tag's wire data type, with its CIP type code and element width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipType {
    Bool,
    Sint,
    Int,
    Dint,
    Lint,
    Usint,
    Uint,
    Udint,
    Ulint,
    Real,
    Lreal,
    /// 4-byte length + 82 chars + 2 pad = 88 bytes.
    String,
    /// Synthesized transport type for ControlLogix `BOOL[n>1]` arrays.
    BitString32,
}

impl CipType {
    pub fn code(self) -> u16 {
        match self {
            CipType::Bool => 0x00C1,
            CipType::Sint => 0x00C2,
            CipType::Int => 0x00C3,
            CipType::Dint => 0x00C4,
            CipType::Lint => 0x00C5,
            CipType::Usint => 0x00C6,
            CipType::Uint => 0x00C7,
            CipType::Udint => 0x00C8,
            CipType::Ulint => 0x00C9,
            CipType::Real => 0x00CA,
            CipType::Lreal => 0x00CB,
            CipType::String => 0x00D0,
            CipType::BitString32 => 0x00D3,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0x00C1 => CipType::Bool,
            0x00C2 => CipType::Sint,
            0x00C3 => CipType::Int,
            0x00C4 => CipType::Dint,
            0x00C5 => CipType::Lint,
            0x00C6 => CipType::Usint,
            0x00C7 => CipType::Uint,
            0x00C8 => CipType::Udint,
            0x00C9 => CipType::Ulint,
            0x00CA => CipType::Real,
            0x00CB => CipType::Lreal,
            0x00D0 => CipType::String,
            0x00D3 => CipType::BitString32,
            _ => return None,
        })
    }

    pub fn elem_size(self) -> usize {
        match self {
            CipType::Bool | CipType::Sint | CipType::Usint => 1,
            CipType::Int | CipType::Uint => 2,
            CipType::Dint | CipType::Udint | CipType::Real | CipType::BitString32 => 4,
            CipType::Lint | CipType::Ulint | CipType::Lreal => 8,
            CipType::String => 88,
        }
    }

    /// Parses the `TYPE` token of a `--tag=name:TYPE[dims]` CLI spec.
    /// Case-insensitive; the synthesized `BitString32` is never user-named.
    pub fn from_name(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "BOOL" => CipType::Bool,
            "SINT" => CipType::Sint,
            "INT" => CipType::Int,
            "DINT" => CipType::Dint,
            "LINT" => CipType::Lint,
            "USINT" => CipType::Usint,
            "UINT" => CipType::Uint,
            "UDINT" => CipType::Udint,
            "ULINT" => CipType::Ulint,
            "REAL" => CipType::Real,
            "LREAL" => CipType::Lreal,
            "STRING" => CipType::String,
            _ => return None,
        })
    }
}

/// A PCCC tag's data-file type — `spec.md` §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcccType {
    Int,
    Dint,
    Real,
    /// 2-byte count + 82 chars = 84 bytes.
    String,
}

impl PcccType {
    pub fn code(self) -> u8 {
        match self {
            PcccType::Int => 0x89,
            PcccType::Dint => 0x91,
            PcccType::Real => 0x8A,
            PcccType::String => 0x8D,
        }
    }

    pub fn elem_size(self) -> usize {
        match self {
            PcccType::Int => 2,
            PcccType::Dint => 4,
            PcccType::Real => 4,
            PcccType::String => 84,
        }
    }

    /// Resolves the fixed `FILE` token of a `--tag=FILE[size]` PCCC spec,
    /// per `original_source`'s `parse_pccc_tag`: the file name binds both
    /// the data-file number and the element type.
    pub fn from_file_name(s: &str) -> Option<(Self, u16)> {
        Some(match s.to_ascii_uppercase().as_str() {
            "N7" => (PcccType::Int, 7),
            "F8" => (PcccType::Real, 8),
            "ST18" => (PcccType::String, 18),
            "L19" => (PcccType::Dint, 19),
            _ => return None,
        })
    }
}
