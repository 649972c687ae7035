//! Host-side test doubles for the kernel collaborators.

use core::fmt;

use spin::Mutex;

use crate::cap::CapabilitySet;
use crate::config::Config;
use crate::console::{LogSink, TickClock};
use crate::kernel::SecurityKernel;
use crate::task::{Pid, Task, TaskProvider, Uid};

/// Sink that keeps every line in memory.
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl LogSink for RecordingSink {
    fn write_line(&self, args: fmt::Arguments<'_>) {
        self.lines.lock().push(args.to_string());
    }
}

/// Task provider whose current task can be swapped mid-test.
pub struct SwitchTasks {
    current: Mutex<Task>,
}

impl SwitchTasks {
    pub fn new(task: Task) -> Self {
        Self {
            current: Mutex::new(task),
        }
    }

    pub fn set(&self, task: Task) {
        *self.current.lock() = task;
    }
}

impl TaskProvider for SwitchTasks {
    fn current_task(&self) -> Task {
        *self.current.lock()
    }
}

/// Root task allowed to administer groups and capabilities.
pub fn admin(pid: u32) -> Task {
    Task::new(
        Pid::new(pid),
        Uid::ROOT,
        CapabilitySet::SYS_ADMIN | CapabilitySet::SETPCAP | CapabilitySet::KILL,
    )
}

/// Ordinary user task holding only `CAP_KILL`.
pub fn user(pid: u32) -> Task {
    Task::new(Pid::new(pid), Uid::new(1000), CapabilitySet::KILL)
}

/// Collaborators for one kernel under test.
pub struct Env {
    pub tasks: SwitchTasks,
    pub sink: RecordingSink,
    pub clock: TickClock,
}

impl Env {
    pub fn new(task: Task) -> Self {
        Self {
            tasks: SwitchTasks::new(task),
            sink: RecordingSink::new(),
            clock: TickClock::new(),
        }
    }

    /// Build and initialize a kernel borrowing this environment.
    pub fn kernel(&self, config: Config) -> SecurityKernel<'_> {
        let kernel = SecurityKernel::new(config, &self.tasks, &self.sink, &self.clock)
            .expect("test config must be valid");
        kernel.init();
        kernel
    }
}
