// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background writer for annotation sidecars.
//!
//! A single worker thread drains a job queue, so writes hit the disk in
//! submit order and the last snapshot submitted for a path is the one that
//! stays on disk.

use super::serialization;
use crate::config::SidecarFormat;
use crate::models::project::ImageAnnotations;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;

/// Completion report of one save.
#[derive(Debug)]
pub struct SaveOutcome {
    pub path: PathBuf,
    pub result: Result<()>,
}

struct SaveJob {
    path: PathBuf,
    data: ImageAnnotations,
}

pub struct SaveWorker {
    jobs: Option<Sender<SaveJob>>,
    outcomes: Receiver<SaveOutcome>,
    in_flight: usize,
    handle: Option<JoinHandle<()>>,
}

impl Default for SaveWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveWorker {
    pub fn new() -> Self {
        let (job_sender, job_receiver) = channel::<SaveJob>();
        let (outcome_sender, outcomes) = channel();

        let handle = std::thread::spawn(move || {
            for job in job_receiver {
                let result = serialization::export(&job.data, &job.path);
                if outcome_sender
                    .send(SaveOutcome {
                        path: job.path,
                        result,
                    })
                    .is_err()
                {
                    break;
                }
            }
            log::debug!("Save worker stopped");
        });

        Self {
            jobs: Some(job_sender),
            outcomes,
            in_flight: 0,
            handle: Some(handle),
        }
    }

    /// Queue a sidecar write for `image_path`.
    pub fn submit(&mut self, image_path: &Path, data: ImageAnnotations, format: SidecarFormat) {
        let path = serialization::sidecar_path(image_path, format);
        log::debug!("Queued save of {}", path.display());

        let Some(jobs) = &self.jobs else {
            return;
        };
        match jobs.send(SaveJob { path, data }) {
            Ok(()) => self.in_flight += 1,
            Err(e) => log::error!("Save worker is gone, dropped save of {}", e.0.path.display()),
        }
    }

    /// Drain finished saves without blocking.
    pub fn poll(&mut self) -> Vec<SaveOutcome> {
        let outcomes: Vec<_> = self.outcomes.try_iter().collect();
        self.in_flight -= outcomes.len().min(self.in_flight);
        outcomes
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Block until every queued save has finished.
    pub fn wait(&mut self) -> Vec<SaveOutcome> {
        let mut outcomes = Vec::with_capacity(self.in_flight);
        while self.in_flight > 0 {
            match self.outcomes.recv() {
                Ok(outcome) => {
                    self.in_flight -= 1;
                    outcomes.push(outcome);
                }
                Err(_) => break,
            }
        }
        outcomes
    }
}

impl Drop for SaveWorker {
    fn drop(&mut self) {
        // Closing the queue lets the worker finish what is queued and exit.
        self.jobs = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
