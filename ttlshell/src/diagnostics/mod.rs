//! Standard board bring-up checks.
//!
//! Every check runs one or more shell commands through a [`CommandRunner`]
//! and turns the output into a [`TestResult`]. Commands are written for
//! busybox userlands: optional tools fall back to a marker string instead
//! of failing the shell.

pub mod parsers;

use std::time::Duration;

use log::{debug, info};
use serde::Serialize;
use serde_json::{Value, json};

use crate::driver::{CommandRunner, Response};
use crate::error::{ReportError, Result};
use crate::report::TestResult;

use parsers::{
    parse_cpuinfo, parse_ip_addr, parse_lsusb, parse_meminfo, parse_proc_mtd, parse_temp_millideg,
};

/// Memory check fails below this share of available memory.
pub const MIN_MEM_AVAILABLE_PCT: f64 = 10.0;

/// Temperature check fails at or above this.
pub const MAX_CPU_TEMP_C: f64 = 85.0;

/// Sensors tried in order; the first plausible reading wins.
pub const TEMP_PATHS: [&str; 2] = [
    "/sys/class/hwmon/hwmon0/temp1_input",
    "/sys/class/thermal/thermal_zone0/temp",
];

/// Readings outside ±300 °C are treated as garbage.
const TEMP_PLAUSIBLE_C: f64 = 300.0;

/// Longest `uname -a` shown in the system summary.
const SUMMARY_WIDTH: usize = 90;

/// Run every check in order and collect the results.
///
/// Checks never fail on odd output; only transport and session errors
/// abort the run.
pub async fn run_board_checks<R: CommandRunner>(
    runner: &R,
    timeout: Duration,
) -> Result<Vec<TestResult>> {
    info!("running board checks");
    let results = vec![
        check_cpu(runner, timeout).await?,
        check_memory(runner, timeout).await?,
        check_temperature(runner, timeout).await?,
        check_mtd(runner, timeout).await?,
        check_usb(runner, timeout).await?,
        check_network(runner, timeout).await?,
        check_rtc(runner, timeout).await?,
        check_system(runner, timeout).await?,
    ];

    let passed = results.iter().filter(|r| r.ok).count();
    info!("board checks done: {}/{} passed", passed, results.len());
    Ok(results)
}

/// Output of `command`, whether or not the shell reported a failure.
async fn output<R: CommandRunner>(runner: &R, command: &str, timeout: Duration) -> Result<String> {
    let response = runner.run(command, timeout).await?;
    Ok(result_text(response))
}

/// Outputs of several commands, run back to back.
async fn outputs<R: CommandRunner>(
    runner: &R,
    commands: &[&str],
    timeout: Duration,
) -> Result<Vec<String>> {
    let responses = runner.run_all(commands, timeout).await?;
    Ok(responses.into_iter().map(result_text).collect())
}

fn result_text(response: Response) -> String {
    if !response.is_success() {
        let reason = response.failure_message.as_deref().unwrap_or("");
        debug!("{:?}: {}", response.command, reason);
    }
    response.result
}

fn to_data<S: Serialize>(value: &S) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ReportError::Serialize(e).into())
}

pub async fn check_cpu<R: CommandRunner>(runner: &R, timeout: Duration) -> Result<TestResult> {
    let text = output(runner, "cat /proc/cpuinfo", timeout).await?;
    let cpu = parse_cpuinfo(&text);
    let summary = format!(
        "Cores: {} | {}",
        cpu.cores_detected,
        cpu.hardware().unwrap_or("unknown")
    );

    Ok(TestResult::new("CPU info", cpu.cores_detected >= 1, summary, text, to_data(&cpu)?))
}

pub async fn check_memory<R: CommandRunner>(runner: &R, timeout: Duration) -> Result<TestResult> {
    let text = output(runner, "cat /proc/meminfo", timeout).await?;
    let mem = parse_meminfo(&text);
    let ok = mem.available_pct.is_none_or(|pct| pct >= MIN_MEM_AVAILABLE_PCT);

    let summary = format!(
        "Total: {} kB | Avail: {}%",
        mem.total_kb.map_or_else(|| "None".to_string(), |kb| kb.to_string()),
        mem.available_pct.map_or_else(|| "None".to_string(), |pct| format!("{pct:.1}"))
    );
    let details = text
        .lines()
        .filter(|line| ["MemTotal", "MemAvailable", "MemFree"].iter().any(|k| line.starts_with(k)))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(TestResult::new("Memory", ok, summary, details, to_data(&mem)?))
}

pub async fn check_temperature<R: CommandRunner>(
    runner: &R,
    timeout: Duration,
) -> Result<TestResult> {
    let mut reading: Option<(&str, f64, String)> = None;

    for path in TEMP_PATHS {
        let text = output(runner, &format!("cat {path} 2>/dev/null || true"), timeout).await?;
        if !text.chars().any(|c| c.is_ascii_digit()) {
            continue;
        }
        if let Some(celsius) = parse_temp_millideg(&text).filter(|t| t.abs() < TEMP_PLAUSIBLE_C) {
            reading = Some((path, celsius, text.trim().to_string()));
            break;
        }
    }

    let result = match reading {
        Some((path, celsius, raw)) => TestResult::new(
            "CPU Temperature",
            celsius < MAX_CPU_TEMP_C,
            format!("{celsius:.1} °C"),
            format!("path: {path}\nraw: {raw}"),
            json!({ "temp_c": celsius, "path": path }),
        ),
        None => TestResult::new(
            "CPU Temperature",
            true,
            "Not found",
            "Not found",
            json!({ "temp_c": null, "path": null }),
        ),
    };
    Ok(result)
}

pub async fn check_mtd<R: CommandRunner>(runner: &R, timeout: Duration) -> Result<TestResult> {
    let text = output(runner, "cat /proc/mtd || true", timeout).await?;
    let mtd = parse_proc_mtd(&text);
    let summary = format!("MTD partitions: {}", mtd.mtd_count);

    Ok(TestResult::new("NAND / MTD", mtd.mtd_count > 0, summary, text, to_data(&mtd)?))
}

/// Never fails: an empty bus is a valid state.
pub async fn check_usb<R: CommandRunner>(runner: &R, timeout: Duration) -> Result<TestResult> {
    let command = "lsusb 2>/dev/null || echo 'lsusb not available'";
    let text = output(runner, command, timeout).await?;
    let usb = if text.to_lowercase().contains("not available") {
        Default::default()
    } else {
        parse_lsusb(&text)
    };
    let summary = format!("Devices seen: {}", usb.device_count);

    Ok(TestResult::new("USB (lsusb)", true, summary, text, to_data(&usb)?))
}

pub async fn check_network<R: CommandRunner>(runner: &R, timeout: Duration) -> Result<TestResult> {
    let commands = ["ip -brief addr 2>/dev/null || ip addr", "ip addr"];
    let [brief, full]: [String; 2] = outputs(runner, &commands, timeout)
        .await?
        .try_into()
        .unwrap_or_default();
    let net = parse_ip_addr(&full);
    let summary = format!("Interfaces: {}", net.interfaces.len());

    Ok(TestResult::new("Network (ip addr)", true, summary, brief.trim(), to_data(&net)?))
}

pub async fn check_rtc<R: CommandRunner>(runner: &R, timeout: Duration) -> Result<TestResult> {
    let command = "hwclock -r 2>/dev/null || echo 'hwclock not available'";
    let text = output(runner, command, timeout).await?;
    let ok = !text.to_lowercase().contains("not available");
    let summary = if ok { "OK" } else { "hwclock missing" };
    let data = json!({ "raw": text.trim() });

    Ok(TestResult::new("RTC (hwclock -r)", ok, summary, text, data))
}

pub async fn check_system<R: CommandRunner>(runner: &R, timeout: Duration) -> Result<TestResult> {
    let [uname, uptime]: [String; 2] = outputs(runner, &["uname -a", "uptime"], timeout)
        .await?
        .try_into()
        .unwrap_or_default();

    let mut summary: String = uname.chars().take(SUMMARY_WIDTH).collect();
    if uname.chars().count() > SUMMARY_WIDTH {
        summary.push_str("...");
    }
    let details = format!("{uname}\n\n{uptime}");
    let data = json!({ "uname": uname, "uptime": uptime });

    Ok(TestResult::new("System", true, summary, details, data))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::channel::PatternSet;
    use crate::driver::{Response, ShellConfig, ShellExecutor};
    use crate::transport::mock::MockTransport;

    /// Answers commands from a table; unknown commands print nothing.
    struct FakeBoard {
        outputs: HashMap<&'static str, &'static str>,
        seen: Mutex<Vec<String>>,
    }

    impl FakeBoard {
        fn new(outputs: &[(&'static str, &'static str)]) -> Self {
            Self {
                outputs: outputs.iter().copied().collect(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl CommandRunner for FakeBoard {
        fn is_connected(&self) -> bool {
            true
        }

        async fn run(&self, command: &str, _timeout: Duration) -> Result<Response> {
            self.seen.lock().unwrap().push(command.to_string());
            let out = self.outputs.get(command).copied().unwrap_or("");
            Ok(Response::new(command, out, out, Duration::ZERO))
        }
    }

    const T: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_memory_threshold() {
        let low = FakeBoard::new(&[(
            "cat /proc/meminfo",
            "MemTotal: 1000 kB\nMemAvailable: 50 kB",
        )]);
        let result = check_memory(&low, T).await.unwrap();
        assert!(!result.ok);
        assert_eq!(result.summary, "Total: 1000 kB | Avail: 5.0%");

        let fine = FakeBoard::new(&[(
            "cat /proc/meminfo",
            "MemTotal: 1000 kB\nMemAvailable: 100 kB\nCached: 1 kB",
        )]);
        let result = check_memory(&fine, T).await.unwrap();
        assert!(result.ok);
        assert_eq!(result.details, "MemTotal: 1000 kB\nMemAvailable: 100 kB");
    }

    #[tokio::test]
    async fn test_memory_without_available_passes() {
        let board = FakeBoard::new(&[("cat /proc/meminfo", "MemTotal: 1000 kB")]);
        let result = check_memory(&board, T).await.unwrap();
        assert!(result.ok);
        assert_eq!(result.summary, "Total: 1000 kB | Avail: None%");
    }

    #[tokio::test]
    async fn test_temperature_falls_back_to_thermal_zone() {
        let board = FakeBoard::new(&[(
            "cat /sys/class/thermal/thermal_zone0/temp 2>/dev/null || true",
            "91300",
        )]);

        let result = check_temperature(&board, T).await.unwrap();

        assert!(!result.ok);
        assert_eq!(result.summary, "91.3 °C");
        assert_eq!(result.data["path"], "/sys/class/thermal/thermal_zone0/temp");
        assert_eq!(board.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_temperature_ignores_implausible_reading() {
        let board = FakeBoard::new(&[
            ("cat /sys/class/hwmon/hwmon0/temp1_input 2>/dev/null || true", "999999"),
            ("cat /sys/class/thermal/thermal_zone0/temp 2>/dev/null || true", "42000"),
        ]);

        let result = check_temperature(&board, T).await.unwrap();

        assert!(result.ok);
        assert_eq!(result.data["temp_c"], 42.0);
    }

    #[tokio::test]
    async fn test_temperature_not_found() {
        let board = FakeBoard::new(&[]);
        let result = check_temperature(&board, T).await.unwrap();

        assert!(result.ok);
        assert_eq!(result.summary, "Not found");
        assert!(result.data["temp_c"].is_null());
    }

    #[tokio::test]
    async fn test_missing_tools() {
        let board = FakeBoard::new(&[
            ("lsusb 2>/dev/null || echo 'lsusb not available'", "lsusb not available"),
            ("hwclock -r 2>/dev/null || echo 'hwclock not available'", "hwclock not available"),
        ]);

        let usb = check_usb(&board, T).await.unwrap();
        assert!(usb.ok);
        assert_eq!(usb.data["device_count"], 0);

        let rtc = check_rtc(&board, T).await.unwrap();
        assert!(!rtc.ok);
        assert_eq!(rtc.summary, "hwclock missing");
    }

    #[tokio::test]
    async fn test_no_mtd_fails() {
        let board = FakeBoard::new(&[("cat /proc/mtd || true", "")]);
        let result = check_mtd(&board, T).await.unwrap();
        assert!(!result.ok);
        assert_eq!(result.summary, "MTD partitions: 0");
    }

    #[tokio::test]
    async fn test_system_summary_truncated() {
        let long = "Linux board 5.15.0-sunxi #1 SMP PREEMPT Thu Jan 1 00:00:00 UTC 2026 \
                    armv7l GNU/Linux with a long tail";
        let board = FakeBoard::new(&[("uname -a", long), ("uptime", "up 1 min")]);

        let result = check_system(&board, T).await.unwrap();

        assert!(result.summary.ends_with("..."));
        assert_eq!(result.summary.chars().count(), SUMMARY_WIDTH + 3);
        assert_eq!(result.details, format!("{long}\n\nup 1 min"));
    }

    #[tokio::test]
    async fn test_network_brief_and_full() {
        let board = FakeBoard::new(&[
            (
                "ip -brief addr 2>/dev/null || ip addr",
                "lo    UNKNOWN  127.0.0.1/8\neth0  UP       192.168.1.50/24\n",
            ),
            (
                "ip addr",
                concat!(
                    "1: lo: <LOOPBACK,UP,LOWER_UP> mtu 65536 state UNKNOWN\n",
                    "    inet 127.0.0.1/8 scope host lo\n",
                    "2: eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 state UP\n",
                    "    inet 192.168.1.50/24 scope global eth0",
                ),
            ),
        ]);

        let result = check_network(&board, T).await.unwrap();

        assert!(result.ok);
        assert_eq!(result.summary, "Interfaces: 2");
        assert!(result.details.starts_with("lo    UNKNOWN"));
        assert!(!result.details.ends_with('\n'));
        assert_eq!(result.data["interfaces"]["eth0"]["inet"][0], "192.168.1.50/24");
        assert_eq!(board.seen(), ["ip -brief addr 2>/dev/null || ip addr", "ip addr"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_suite_over_serial_session() {
        const PROMPT: &str = "root@board:~# ";
        let mock = MockTransport::new(|written| {
            let command = written.trim_end();
            let out = match command {
                "cat /proc/cpuinfo" => "processor\t: 0\nHardware\t: Generic AM33XX",
                "cat /proc/meminfo" => "MemTotal: 500000 kB\nMemAvailable: 250000 kB",
                "cat /sys/class/hwmon/hwmon0/temp1_input 2>/dev/null || true" => "45500",
                "cat /proc/mtd || true" => "mtd0: 00080000 00020000 \"SPL\"",
                "hwclock -r 2>/dev/null || echo 'hwclock not available'" => {
                    "2026-01-01 00:00:00.000000+0000"
                }
                "uname -a" => "Linux am335x 4.19.94",
                _ => "",
            };
            Some(format!("{command}\r\n{}\r\n{PROMPT}", out.replace('\n', "\r\n")))
        });
        let shell = ShellExecutor::new(ShellConfig::default(), PatternSet::default());
        shell.attach(mock.clone()).await;

        let results = run_board_checks(&shell, T).await.unwrap();

        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "CPU info",
                "Memory",
                "CPU Temperature",
                "NAND / MTD",
                "USB (lsusb)",
                "Network (ip addr)",
                "RTC (hwclock -r)",
                "System",
            ]
        );
        assert!(results.iter().all(|r| r.ok), "{results:#?}");
        assert_eq!(results[0].summary, "Cores: 1 | Generic AM33XX");
        assert_eq!(results[2].summary, "45.5 °C");
        assert_eq!(results[7].summary, "Linux am335x 4.19.94");
        // hwmon answered, so the thermal zone is never read
        assert_eq!(mock.writes().len(), 10);
    }
}
