//! Serial transport implementation using the `serialport` crate.
//!
//! `serialport` exposes blocking I/O with a hardware read timeout. Each
//! operation runs on tokio's blocking pool so the async shell driver never
//! stalls a runtime worker while the UART is quiet.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, trace};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};

use super::config::SerialConfig;
use super::{READ_CHUNK, Transport};
use crate::error::{Result, TransportError};

/// Delay between opening the device and flushing its buffers, letting
/// USB-TTL adapters settle.
const SETTLE_DELAY: Duration = Duration::from_millis(200);

type SharedPort = Arc<Mutex<Box<dyn SerialPort>>>;

/// Serial transport over a USB-TTL (or native) UART.
pub struct SerialTransport {
    /// The open port (None once closed).
    port: Option<SharedPort>,

    /// Configuration used for this connection.
    config: SerialConfig,
}

impl SerialTransport {
    /// Open the serial device with 8-N-1 framing.
    ///
    /// Fails with `TransportError::OpenFailed` when the device is missing,
    /// busy or not accessible. The port is never retried.
    pub async fn open(config: SerialConfig) -> Result<Self> {
        debug!("opening {} at {} baud", config.port, config.baud_rate);

        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::OpenFailed {
                port: config.port.clone(),
                source,
            })?;

        let transport = Self {
            port: Some(Arc::new(Mutex::new(port))),
            config,
        };

        tokio::time::sleep(SETTLE_DELAY).await;
        transport
            .with_port(|port| clear(port, ClearBuffer::All))
            .await?;

        Ok(transport)
    }

    /// Get the configuration this transport was opened with.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Run a blocking operation against the port on the blocking pool.
    async fn with_port<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&mut dyn SerialPort) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let port = self.port.clone().ok_or(TransportError::NotOpen)?;

        tokio::task::spawn_blocking(move || {
            let mut guard = port
                .lock()
                .map_err(|_| TransportError::Task("serial port lock poisoned".to_string()))?;
            op(&mut **guard)
        })
        .await
        .map_err(|e| TransportError::Task(e.to_string()))?
    }
}

fn clear(port: &mut dyn SerialPort, which: ClearBuffer) -> Result<()> {
    port.clear(which).map_err(TransportError::Serial)?;
    Ok(())
}

impl Transport for SerialTransport {
    async fn read_chunk(&mut self) -> Result<Vec<u8>> {
        if self.port.is_none() {
            return Ok(Vec::new());
        }

        let data = self
            .with_port(|port| {
                let mut buf = vec![0u8; READ_CHUNK];
                match port.read(&mut buf) {
                    Ok(n) => {
                        buf.truncate(n);
                        Ok(buf)
                    }
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::TimedOut
                                | io::ErrorKind::WouldBlock
                                | io::ErrorKind::Interrupted
                        ) =>
                    {
                        Ok(Vec::new())
                    }
                    Err(e) => Err(TransportError::Io(e).into()),
                }
            })
            .await?;

        if !data.is_empty() {
            trace!("serial read {} bytes", data.len());
        }
        Ok(data)
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let data = data.to_vec();
        let write_timeout = self.config.write_timeout;
        let read_timeout = self.config.read_timeout;

        self.with_port(move |port| {
            // serialport has one timeout for both directions
            port.set_timeout(write_timeout).map_err(TransportError::Serial)?;
            let written = port.write_all(&data).and_then(|_| port.flush());
            port.set_timeout(read_timeout).map_err(TransportError::Serial)?;
            written.map_err(TransportError::Io)?;
            Ok(())
        })
        .await
    }

    async fn clear_input(&mut self) -> Result<()> {
        self.with_port(|port| clear(port, ClearBuffer::Input)).await
    }

    async fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            debug!("closed {}", self.config.port);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

/// A serial port visible on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device name to pass to [`SerialConfig::new`].
    pub name: String,

    /// Human readable description (USB product/manufacturer when known).
    pub description: String,
}

impl std::fmt::Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} - {}", self.name, self.description)
        }
    }
}

/// List the serial ports currently present.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Serial)?;

    Ok(ports
        .into_iter()
        .map(|p| {
            let description = match p.port_type {
                SerialPortType::UsbPort(usb) => {
                    let parts: Vec<String> =
                        [usb.manufacturer, usb.product].into_iter().flatten().collect();
                    if parts.is_empty() {
                        format!("USB {:04x}:{:04x}", usb.vid, usb.pid)
                    } else {
                        parts.join(" ")
                    }
                }
                SerialPortType::PciPort => "PCI".to_string(),
                SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                SerialPortType::Unknown => String::new(),
            };
            PortInfo {
                name: p.port_name,
                description,
            }
        })
        .collect())
}
