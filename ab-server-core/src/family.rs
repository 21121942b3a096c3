//! Per-PLC-family configuration — `spec.md` §6, grounded in
//! `original_source`'s `arg_parser.c::process_plc_arg`.

/// One row of the per-family configuration table in `spec.md` §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlcFamily {
    ControlLogix,
    Micro800,
    Omron,
    Plc5,
    Slc500,
    MicroLogix,
}

impl PlcFamily {
    pub fn from_name(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "controllogix" => PlcFamily::ControlLogix,
            "micro800" => PlcFamily::Micro800,
            "omron" => PlcFamily::Omron,
            "plc/5" | "plc5" => PlcFamily::Plc5,
            "slc500" | "slc/500" => PlcFamily::Slc500,
            "micrologix" => PlcFamily::MicroLogix,
            _ => return None,
        })
    }

    /// Only ControlLogix demands an explicit `--path=a,b`.
    pub fn requires_path(self) -> bool {
        matches!(self, PlcFamily::ControlLogix)
    }

    pub fn max_packet(self) -> u16 {
        match self {
            PlcFamily::ControlLogix => 502,
            PlcFamily::Micro800 | PlcFamily::Omron => 504,
            PlcFamily::Plc5 | PlcFamily::Slc500 | PlcFamily::MicroLogix => 244,
        }
    }

    /// Whether this family speaks PCCC (tunneled through CIP service 0x4B)
    /// instead of native CIP tag services.
    pub fn is_pccc(self) -> bool {
        matches!(self, PlcFamily::Plc5 | PlcFamily::Slc500 | PlcFamily::MicroLogix)
    }

    pub fn is_control_logix(self) -> bool {
        matches!(self, PlcFamily::ControlLogix)
    }

    pub fn is_omron(self) -> bool {
        matches!(self, PlcFamily::Omron)
    }

    /// The exact connection EPATH Forward Open / Forward Close must match.
    /// `path` is the two bytes from `--path=a,b`, required iff
    /// `requires_path()`.
    pub fn expected_epath(self, path: Option<(u8, u8)>) -> Vec<u8> {
        match self {
            PlcFamily::ControlLogix => {
                let (a, b) = path.expect("ControlLogix requires --path");
                vec![a, b, 0x20, 0x02, 0x24, 0x01]
            }
            PlcFamily::Micro800 | PlcFamily::Plc5 | PlcFamily::Slc500 | PlcFamily::MicroLogix => {
                vec![0x20, 0x02, 0x24, 0x01]
            }
            PlcFamily::Omron => {
                let mut path = vec![0x12, 0x09];
                path.extend_from_slice(b"127.0.0.1");
                path.push(0x00);
                path.extend_from_slice(&[0x20, 0x02, 0x24, 0x01]);
                path
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_logix_epath_uses_supplied_path_bytes() {
        let path = PlcFamily::ControlLogix.expected_epath(Some((1, 2)));
        assert_eq!(path, vec![1, 2, 0x20, 0x02, 0x24, 0x01]);
    }

    #[test]
    fn omron_epath_is_sixteen_bytes() {
        let path = PlcFamily::Omron.expected_epath(None);
        assert_eq!(path.len(), 16);
        assert_eq!(&path[2..11], b"127.0.0.1");
    }

    #[test]
    fn only_control_logix_requires_a_path() {
        assert!(PlcFamily::ControlLogix.requires_path());
        assert!(!PlcFamily::Micro800.requires_path());
        assert!(!PlcFamily::Omron.requires_path());
    }

    #[test]
    fn pccc_families_are_plc5_slc_micrologix() {
        assert!(PlcFamily::Plc5.is_pccc());
        assert!(PlcFamily::Slc500.is_pccc());
        assert!(PlcFamily::MicroLogix.is_pccc());
        assert!(!PlcFamily::ControlLogix.is_pccc());
        assert!(!PlcFamily::Omron.is_pccc());
    }
}
