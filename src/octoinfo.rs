/*
 *  octoinfo.rs
 *
 *  OctoMon - printer status at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Printer status snapshot and the background poller that keeps it fresh
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
use chrono::{DateTime, Local};
use log::{debug, error, info};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::deutils::{deserialize_opt_f64_from_anything, deserialize_opt_u64_from_anything};
use crate::netinfo::{self, InterfaceInfo};
use crate::octoclient::OctoClient;

pub const OFFLINE: &str = "Offline";
pub const PLACEHOLDER_FILE: &str = "_.gcode";

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct JobFile {
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_opt_u64_from_anything")]
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct JobInfo {
    pub file: JobFile,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct JobProgress {
    #[serde(deserialize_with = "deserialize_opt_f64_from_anything")]
    pub completion: Option<f64>,
    #[serde(deserialize_with = "deserialize_opt_u64_from_anything")]
    pub print_time_left: Option<u64>,
}

/// GET /api/job
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct JobResponse {
    pub job: JobInfo,
    pub progress: JobProgress,
    pub state: Option<String>,
}

/// GET /api/version
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct VersionResponse {
    pub api: Option<String>,
    pub server: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ConnectionCurrent {
    pub state: Option<String>,
    pub port: Option<String>,
}

/// GET /api/connection
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ConnectionResponse {
    pub current: ConnectionCurrent,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Temperature {
    #[serde(deserialize_with = "deserialize_opt_f64_from_anything")]
    pub actual: Option<f64>,
    #[serde(deserialize_with = "deserialize_opt_f64_from_anything")]
    pub target: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct PrinterTemperatures {
    pub tool0: Temperature,
    pub bed: Temperature,
}

/// GET /api/printer
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct PrinterResponse {
    pub temperature: PrinterTemperatures,
}

/// Whole degrees Celsius, as the dashboard shows them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Temps {
    pub actual: i32,
    pub target: i32,
}

impl From<Temperature> for Temps {
    fn from(t: Temperature) -> Self {
        // truncated like int() on the wire value
        Temps {
            actual: t.actual.unwrap_or(0.0) as i32,
            target: t.target.unwrap_or(0.0) as i32,
        }
    }
}

/// One fetch worth of printer state. Every field has a renderable default.
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterStatus {
    pub connection_state: String,
    pub job_state: String,
    pub file_name: String,
    pub file_size: u64,
    pub completion: Option<u8>,
    pub print_time_left: Option<u64>,
    pub api_version: String,
    pub server_version: String,
    pub tool: Temps,
    pub bed: Temps,
    pub interfaces: Vec<InterfaceInfo>,
    pub fetched: Option<DateTime<Local>>,
}

impl Default for PrinterStatus {
    fn default() -> Self {
        Self {
            connection_state: OFFLINE.to_string(),
            job_state: OFFLINE.to_string(),
            file_name: PLACEHOLDER_FILE.to_string(),
            file_size: 0,
            completion: None,
            print_time_left: None,
            api_version: "0".to_string(),
            server_version: "0".to_string(),
            tool: Temps::default(),
            bed: Temps::default(),
            interfaces: Vec::new(),
            fetched: None,
        }
    }
}

fn typed<T: for<'de> Deserialize<'de>>(what: &str, v: Option<Value>) -> Option<T> {
    let v = v?;
    match serde_json::from_value::<T>(v) {
        Ok(t) => Some(t),
        Err(e) => {
            debug!("malformed {} response: {}", what, e);
            None
        }
    }
}

impl PrinterStatus {
    pub fn is_online(&self) -> bool {
        self.connection_state != OFFLINE
    }

    pub fn is_paused(&self) -> bool {
        self.job_state.starts_with("Paus")
    }

    /// Folds whatever came back into a snapshot; `None` means "no data".
    pub fn from_responses(
        job: Option<JobResponse>,
        version: Option<VersionResponse>,
        connection: Option<ConnectionResponse>,
        printer: Option<PrinterResponse>,
        interfaces: Vec<InterfaceInfo>,
    ) -> Self {
        let mut status = PrinterStatus { interfaces, fetched: Some(Local::now()), ..Default::default() };

        if let Some(job) = job {
            if let Some(state) = job.state {
                status.job_state = state;
            }
            if let Some(name) = job.job.file.name {
                status.file_name = name;
            }
            status.file_size = job.job.file.size.unwrap_or(0);
            status.completion = job.progress.completion.map(|c| c.round().clamp(0.0, 100.0) as u8);
            status.print_time_left = job.progress.print_time_left;
        }

        if let Some(ver) = version {
            status.api_version = ver.api.unwrap_or_else(|| "0".to_string());
            status.server_version = ver.server.unwrap_or_else(|| "0".to_string());
        }

        match connection.and_then(|c| c.current.state) {
            Some(state) => status.connection_state = state,
            None => {
                status.connection_state = OFFLINE.to_string();
                status.completion = Some(0);
            }
        }

        if status.is_online() {
            if let Some(printer) = printer {
                status.tool = printer.temperature.tool0.into();
                status.bed = printer.temperature.bed.into();
            }
        }

        status
    }
}

/// Fetches all four endpoints, the printer only when the connection is up.
pub async fn fetch_status(client: &OctoClient, interfaces: &[String]) -> PrinterStatus {
    let (job, version, connection) = tokio::join!(
        client.get_info_opt("job"),
        client.get_info_opt("version"),
        client.get_info_opt("connection"),
    );
    let job: Option<JobResponse> = typed("job", job);
    let version: Option<VersionResponse> = typed("version", version);
    let connection: Option<ConnectionResponse> = typed("connection", connection);

    let online = connection
        .as_ref()
        .and_then(|c| c.current.state.as_deref())
        .is_some_and(|s| s != OFFLINE);
    let printer: Option<PrinterResponse> = if online {
        typed("printer", client.get_info_opt("printer").await)
    } else {
        None
    };

    let ifaces = interfaces.iter().map(|n| netinfo::interface_info(n)).collect();
    PrinterStatus::from_responses(job, version, connection, printer, ifaces)
}

/// What the display loop holds: the latest snapshot and a way to ask for another.
#[derive(Debug, Clone)]
pub struct StatusFeed {
    status_rx: watch::Receiver<PrinterStatus>,
    refresh: Arc<AtomicBool>,
}

impl StatusFeed {
    /// A feed that never changes, for running without a server.
    pub fn fixed(status: PrinterStatus) -> Self {
        let (_tx, status_rx) = watch::channel(status);
        Self { status_rx, refresh: Arc::new(AtomicBool::new(false)) }
    }

    pub fn ask_refresh(&self) {
        self.refresh.store(true, Ordering::Release);
    }

    pub fn refresh_pending(&self) -> bool {
        self.refresh.load(Ordering::Acquire)
    }

    pub fn latest(&self) -> PrinterStatus {
        self.status_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PrinterStatus> {
        self.status_rx.clone()
    }
}

/// Background poller. Fetches at most once per interval, and only when asked.
pub struct StatusPoller {
    feed: StatusFeed,
    stop_sender: Option<mpsc::Sender<()>>,
    poll_handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    pub fn start(client: OctoClient, interfaces: Vec<String>, interval: Duration) -> Self {
        let (status_tx, status_rx) = watch::channel(PrinterStatus::default());
        let refresh = Arc::new(AtomicBool::new(true));
        let (tx, mut rx) = mpsc::channel::<()>(1);

        let refresh_for_poll = Arc::clone(&refresh);
        let poll_handle = tokio::spawn(async move {
            loop {
                if refresh_for_poll.swap(false, Ordering::AcqRel) {
                    let status = tokio::select! {
                        s = fetch_status(&client, &interfaces) => s,
                        _ = rx.recv() => break,
                    };
                    debug!(
                        "status: {} / {} {:?}%",
                        status.connection_state, status.job_state, status.completion
                    );
                    if status_tx.send(status).is_err() {
                        break;
                    }
                }
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = rx.recv() => {
                        debug!("Status polling task received stop signal. Exiting.");
                        break;
                    }
                }
            }
        });

        Self {
            feed: StatusFeed { status_rx, refresh },
            stop_sender: Some(tx),
            poll_handle: Some(poll_handle),
        }
    }

    pub fn feed(&self) -> StatusFeed {
        self.feed.clone()
    }

    /// Stops the task and waits for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(sender) = self.stop_sender.take() {
            let _ = sender.send(()).await;
        }
        if let Some(handle) = self.poll_handle.take() {
            if let Err(e) = handle.await {
                error!("status poller ended badly: {}", e);
            }
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        if let Some(sender) = self.stop_sender.take() {
            info!("StatusPoller dropped, stopping polling task");
            if let Err(e) = sender.try_send(()) {
                error!("Failed to send stop signal to polling task: {}", e);
            }
        }
    }
}
