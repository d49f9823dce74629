/*
 *  commands.rs
 *
 *  OctoMon - printer status at a glance
 *	(c) 2020-26 Stuart Hunter
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
use log::{info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::octoclient::{ConnectionCommand, JobCommand, OctoClient};
use crate::system::{PowerAction, PowerControl};

/// Everything a button press can ask the outside world to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Job(JobCommand),
    Connection(ConnectionCommand),
    Power(PowerAction),
}

impl Action {
    /// Destructive actions wait for a Yes on the confirmation screen.
    pub fn needs_confirmation(&self) -> bool {
        matches!(
            self,
            Action::Job(JobCommand::Cancel)
                | Action::Connection(ConnectionCommand::Disconnect)
                | Action::Power(_)
        )
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Action::Job(JobCommand::Cancel) => "Are you sure you want to cancel the current job?",
            Action::Job(JobCommand::Pause) => "Pause the current job?",
            Action::Job(JobCommand::Resume) => "Resume the current job?",
            Action::Connection(ConnectionCommand::Disconnect) => "Are you sure you want to disconnect the printer?",
            Action::Connection(ConnectionCommand::Connect) => "Connect the printer?",
            Action::Power(PowerAction::Reboot) => "Are you sure you want to reboot?",
            Action::Power(PowerAction::PowerOff) => "Are you sure you want to power off?",
        }
    }
}

pub type ActionSender = mpsc::UnboundedSender<Action>;

/// Runs each action on its own task, results are only logged.
pub fn spawn_dispatcher(
    client: OctoClient,
    power: PowerControl,
    mut rx: mpsc::UnboundedReceiver<Action>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(action) = rx.recv().await {
            info!("dispatching {:?}", action);
            let client = client.clone();
            let power = power.clone();
            tokio::spawn(async move {
                let result = match action {
                    Action::Job(cmd) => client.job_command(cmd).await.map_err(|e| e.to_string()),
                    Action::Connection(cmd) => client.connection_command(cmd).await.map_err(|e| e.to_string()),
                    Action::Power(p) => power.execute(p).await.map_err(|e| e.to_string()),
                };
                if let Err(e) = result {
                    warn!("{:?} failed: {}", action, e);
                }
            });
        }
    })
}
