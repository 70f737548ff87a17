//! Parsers for the `/proc` and tool output the board checks read.
//!
//! Each parser is lenient: missing fields become `None` or empty lists,
//! since busybox images differ in what they print.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static PROCESSOR_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^processor\s*:\s*\d+").expect("valid processor regex"));

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+").expect("valid integer regex"));

static MTD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(mtd\d+):\s+([0-9a-fA-F]+)\s+([0-9a-fA-F]+)\s+"(.+)""#).expect("valid mtd regex")
});

static IP_LINK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+:\s+([^:]+):\s+<([^>]*)>.*state\s+(\w+)").expect("valid link regex")
});

static IP_INET_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+inet\s+([0-9.]+)/(\d+)").expect("valid inet regex"));

/// `/proc/cpuinfo` keys worth reporting.
pub const CPUINFO_KEYS: [&str; 8] = [
    "model name",
    "Processor",
    "Hardware",
    "Revision",
    "BogoMIPS",
    "Features",
    "CPU architecture",
    "Serial",
];

/// Selected `/proc/cpuinfo` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CpuInfo {
    /// First value seen for each of [`CPUINFO_KEYS`].
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,

    /// Number of `processor : N` lines, at least 1.
    pub cores_detected: usize,
}

impl CpuInfo {
    /// SoC name: `Hardware`, else `Processor`.
    pub fn hardware(&self) -> Option<&str> {
        self.fields
            .get("Hardware")
            .or_else(|| self.fields.get("Processor"))
            .map(String::as_str)
    }
}

pub fn parse_cpuinfo(text: &str) -> CpuInfo {
    let mut fields = BTreeMap::new();
    for key in CPUINFO_KEYS {
        if let Some(value) = text.lines().find_map(|line| field_value(line, key)) {
            fields.insert(key.to_string(), value.to_string());
        }
    }

    let cores = PROCESSOR_LINE.find_iter(text).count();
    CpuInfo {
        fields,
        cores_detected: cores.max(1),
    }
}

/// `key   : value` with a non-empty value.
fn field_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?.trim_start();
    let value = rest.strip_prefix(':')?.trim();
    (!value.is_empty()).then_some(value)
}

/// Memory figures from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemInfo {
    #[serde(rename = "MemTotal_kB")]
    pub total_kb: Option<u64>,

    #[serde(rename = "MemAvailable_kB")]
    pub available_kb: Option<u64>,

    #[serde(rename = "MemFree_kB")]
    pub free_kb: Option<u64>,

    /// Available as a share of total, one decimal.
    #[serde(rename = "MemAvailable_pct")]
    pub available_pct: Option<f64>,
}

pub fn parse_meminfo(text: &str) -> MemInfo {
    let kb = |name: &str| {
        text.lines().find_map(|line| {
            let rest = line.strip_prefix(name)?.strip_prefix(':')?;
            let mut parts = rest.split_whitespace();
            let value = parts.next()?.parse::<u64>().ok()?;
            (parts.next() == Some("kB")).then_some(value)
        })
    };

    let total_kb = kb("MemTotal");
    let available_kb = kb("MemAvailable");
    let available_pct = match (total_kb, available_kb) {
        (Some(total), Some(available)) if total > 0 && available > 0 => {
            Some((available as f64 / total as f64 * 1000.0).round() / 10.0)
        }
        _ => None,
    };

    MemInfo {
        total_kb,
        available_kb,
        free_kb: kb("MemFree"),
        available_pct,
    }
}

/// First integer in `text`, read as millidegrees Celsius.
pub fn parse_temp_millideg(text: &str) -> Option<f64> {
    let m = INTEGER.find(text.trim())?;
    let millideg: i64 = m.as_str().parse().ok()?;
    Some(millideg as f64 / 1000.0)
}

/// One line of `/proc/mtd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MtdPartition {
    pub name: String,
    pub size_hex: String,
    pub erase_hex: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MtdTable {
    pub mtd_count: usize,
    pub mtd: Vec<MtdPartition>,
}

pub fn parse_proc_mtd(text: &str) -> MtdTable {
    let mtd: Vec<MtdPartition> = text
        .lines()
        .filter_map(|line| {
            let caps = MTD_LINE.captures(line.trim())?;
            Some(MtdPartition {
                name: caps[1].to_string(),
                size_hex: caps[2].to_string(),
                erase_hex: caps[3].to_string(),
                label: caps[4].to_string(),
            })
        })
        .collect();

    MtdTable {
        mtd_count: mtd.len(),
        mtd,
    }
}

/// One interface from `ip addr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interface {
    /// Operational state (`UP`, `DOWN`, `UNKNOWN`).
    pub state: String,

    /// Link flags between the angle brackets.
    pub flags: String,

    /// IPv4 addresses in CIDR form.
    pub inet: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Interfaces {
    pub interfaces: BTreeMap<String, Interface>,
}

pub fn parse_ip_addr(text: &str) -> Interfaces {
    let mut interfaces = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        if let Some(caps) = IP_LINK_LINE.captures(line) {
            let name = caps[1].to_string();
            interfaces.insert(
                name.clone(),
                Interface {
                    state: caps[3].to_string(),
                    flags: caps[2].to_string(),
                    inet: Vec::new(),
                },
            );
            current = Some(name);
        }

        if let Some(caps) = IP_INET_LINE.captures(line) {
            if let Some(iface) = current.as_ref().and_then(|name| interfaces.get_mut(name)) {
                iface.inet.push(format!("{}/{}", &caps[1], &caps[2]));
            }
        }
    }

    Interfaces { interfaces }
}

/// Non-blank `lsusb` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsbDevices {
    pub device_count: usize,
    pub devices: Vec<String>,
}

pub fn parse_lsusb(text: &str) -> UsbDevices {
    let devices: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    UsbDevices {
        device_count: devices.len(),
        devices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPUINFO: &str = "processor\t: 0
model name\t: ARMv7 Processor rev 5 (v7l)
BogoMIPS\t: 24.00
Features\t: half thumb fastmult vfp edsp neon vfpv3 tls vfpv4 idiva idivt vfpd32 lpae

processor\t: 1
model name\t: ARMv7 Processor rev 5 (v7l)
BogoMIPS\t: 24.00

Hardware\t: Allwinner sun8i Family
Revision\t: 0000
Serial\t\t: 02c00081c2a2b7d4";

    #[test]
    fn test_parse_cpuinfo() {
        let cpu = parse_cpuinfo(CPUINFO);

        assert_eq!(cpu.cores_detected, 2);
        assert_eq!(cpu.fields["model name"], "ARMv7 Processor rev 5 (v7l)");
        assert_eq!(cpu.fields["Serial"], "02c00081c2a2b7d4");
        assert_eq!(cpu.hardware(), Some("Allwinner sun8i Family"));
        assert!(!cpu.fields.contains_key("CPU architecture"));
    }

    #[test]
    fn test_parse_cpuinfo_single_core_fallback() {
        let cpu = parse_cpuinfo("Processor\t: ARM926EJ-S rev 5 (v5l)\nBogoMIPS\t: 226.09");
        assert_eq!(cpu.cores_detected, 1);
        assert_eq!(cpu.hardware(), Some("ARM926EJ-S rev 5 (v5l)"));

        let value = serde_json::to_value(&cpu).unwrap();
        assert_eq!(value["cores_detected"], 1);
        assert_eq!(value["BogoMIPS"], "226.09");
    }

    #[test]
    fn test_parse_meminfo() {
        let mem = parse_meminfo(
            "MemTotal:         505444 kB\n\
             MemFree:          301220 kB\n\
             MemAvailable:     402140 kB\n\
             Buffers:            8040 kB",
        );

        assert_eq!(mem.total_kb, Some(505_444));
        assert_eq!(mem.free_kb, Some(301_220));
        assert_eq!(mem.available_kb, Some(402_140));
        assert_eq!(mem.available_pct, Some(79.6));

        let value = serde_json::to_value(&mem).unwrap();
        assert_eq!(value["MemTotal_kB"], 505_444);
        assert_eq!(value["MemAvailable_pct"], 79.6);
    }

    #[test]
    fn test_parse_meminfo_old_kernel() {
        // no MemAvailable before 3.14
        let mem = parse_meminfo("MemTotal:  61768 kB\nMemFree:  12044 kB");
        assert_eq!(mem.available_kb, None);
        assert_eq!(mem.available_pct, None);
    }

    #[test]
    fn test_parse_temp() {
        assert_eq!(parse_temp_millideg("48312\n"), Some(48.312));
        assert_eq!(parse_temp_millideg("-5000"), Some(-5.0));
        assert_eq!(parse_temp_millideg(""), None);
        assert_eq!(parse_temp_millideg("n/a"), None);
    }

    #[test]
    fn test_parse_proc_mtd() {
        let mtd = parse_proc_mtd(
            "dev:    size   erasesize  name\n\
             mtd0: 00100000 00020000 \"u-boot\"\n\
             mtd1: 00500000 00020000 \"kernel\"\n\
             mtd2: 0fa00000 00020000 \"rootfs\"",
        );

        assert_eq!(mtd.mtd_count, 3);
        assert_eq!(
            mtd.mtd[2],
            MtdPartition {
                name: "mtd2".into(),
                size_hex: "0fa00000".into(),
                erase_hex: "00020000".into(),
                label: "rootfs".into(),
            }
        );
        assert_eq!(parse_proc_mtd("cat: can't open '/proc/mtd'").mtd_count, 0);
    }

    #[test]
    fn test_parse_ip_addr() {
        let net = parse_ip_addr(
            "1: lo: <LOOPBACK,UP,LOWER_UP> mtu 65536 qdisc noqueue state UNKNOWN qlen 1000
    link/loopback 00:00:00:00:00:00 brd 00:00:00:00:00:00
    inet 127.0.0.1/8 scope host lo
2: eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc pfifo_fast state UP qlen 1000
    link/ether 02:81:c2:a2:b7:d4 brd ff:ff:ff:ff:ff:ff
    inet 192.168.1.50/24 brd 192.168.1.255 scope global eth0
    inet6 fe80::81:c2ff:fea2:b7d4/64 scope link
3: wlan0: <BROADCAST,MULTICAST> mtu 1500 qdisc noop state DOWN qlen 1000",
        );

        assert_eq!(net.interfaces.len(), 3);
        assert_eq!(net.interfaces["lo"].inet, vec!["127.0.0.1/8"]);
        assert_eq!(net.interfaces["eth0"].state, "UP");
        assert_eq!(net.interfaces["eth0"].inet, vec!["192.168.1.50/24"]);
        assert_eq!(net.interfaces["wlan0"].flags, "BROADCAST,MULTICAST");
        assert!(net.interfaces["wlan0"].inet.is_empty());
    }

    #[test]
    fn test_parse_lsusb() {
        let usb = parse_lsusb(
            "Bus 001 Device 001: ID 1d6b:0002\n\nBus 002 Device 002: ID 0bda:8179\n",
        );
        assert_eq!(usb.device_count, 2);
        assert_eq!(usb.devices[1], "Bus 002 Device 002: ID 0bda:8179");
    }
}
