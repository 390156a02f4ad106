/*
 * Copyright (c) 2021 Works Applications Co., Ltd.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Parsing or validating input, size counts items
    Read,
    /// Writing output, size counts bytes
    Write,
}

/// Size and timing of a single compilation step
#[derive(Debug, Clone)]
pub struct DictPartReport {
    part: String,
    kind: StepKind,
    time: Duration,
    size: usize,
}

impl DictPartReport {
    pub fn part(&self) -> &str {
        &self.part
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn time(&self) -> Duration {
        self.time
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_write(&self) -> bool {
        self.kind == StepKind::Write
    }
}

impl Display for DictPartReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let unit = match self.kind {
            StepKind::Read => "items",
            StepKind::Write => "bytes",
        };
        write!(f, "{}: {} {} in {:.3}s", self.part, self.size, unit, self.time.as_secs_f32())
    }
}

/// Running step, finished with [`Reporter::record`]
pub(crate) struct StepTimer {
    part: String,
    kind: StepKind,
    start: Instant,
}

impl StepTimer {
    fn start<S: Into<String>>(part: S, kind: StepKind) -> StepTimer {
        StepTimer {
            part: part.into(),
            kind,
            start: Instant::now(),
        }
    }

    pub fn reading<S: Into<String>>(part: S) -> StepTimer {
        StepTimer::start(part, StepKind::Read)
    }

    pub fn writing<S: Into<String>>(part: S) -> StepTimer {
        StepTimer::start(part, StepKind::Write)
    }
}

#[derive(Default)]
pub(crate) struct Reporter {
    reports: Vec<DictPartReport>,
}

impl Reporter {
    pub fn new() -> Reporter {
        Reporter::default()
    }

    pub fn record(&mut self, size: usize, step: StepTimer) {
        tracing::trace!("{} finished, {:?} size {}", step.part, step.kind, size);
        self.reports.push(DictPartReport {
            time: step.start.elapsed(),
            part: step.part,
            kind: step.kind,
            size,
        });
    }

    /// Failed steps are not recorded
    pub fn record_ok<E>(&mut self, result: Result<usize, E>, step: StepTimer) -> Result<usize, E> {
        if let Ok(size) = result {
            self.record(size, step);
        }
        result
    }

    pub fn reports(&self) -> &[DictPartReport] {
        &self.reports
    }
}
