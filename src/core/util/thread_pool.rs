use std::{
    error, fmt,
    sync::{
        mpsc::{self, Receiver, Sender, SyncSender},
        Arc,
    },
    thread,
};

/// A fixed set of worker threads fed from a bounded job queue. A mux thread hands each job
/// to an idle worker, so `enqueue` blocks once `queue_size` jobs are waiting.
pub struct ThreadPool<Payload: 'static + Send> {
    queue_tx: SyncSender<Signal<Payload>>,
    term_rx: Receiver<()>,
}

impl<Payload: 'static + Send> ThreadPool<Payload> {
    pub fn spawn<JobRunner>(
        size: usize,
        queue_size: usize,
        job_runner: JobRunner,
    ) -> ThreadPool<Payload>
    where
        JobRunner: Fn(Payload) + 'static + Send + Sync,
    {
        let size = size.max(1);

        let (queue_tx, queue_rx) = mpsc::sync_channel(queue_size);
        let (term_tx, term_rx) = mpsc::channel();

        WorkerMux::spawn(size, job_runner, queue_rx, term_tx);
        debug!("Spawned thread pool with {} workers", size);

        ThreadPool { queue_tx, term_rx }
    }

    pub fn enqueue(&self, payload: Payload) -> Result<(), PoolError> {
        match self.queue_tx.send(Signal::Job(payload)) {
            Ok(()) => Ok(()),
            Err(_) => Err(PoolError::QueueClosed),
        }
    }

    /// Runs every job already enqueued, then stops the workers and waits for them.
    pub fn terminate_and_join(self) -> Result<(), PoolError> {
        if self.queue_tx.send(Signal::Terminate).is_err() {
            return Err(PoolError::QueueClosed);
        }
        match self.term_rx.recv() {
            Ok(()) => Ok(()),
            Err(_) => Err(PoolError::JoinFailed),
        }
    }
}

struct WorkerMux {}

impl WorkerMux {
    fn spawn<JobRunner, Payload: 'static + Send>(
        size: usize,
        job_runner: JobRunner,
        queue_rx: Receiver<Signal<Payload>>,
        term_tx: Sender<()>,
    ) where
        JobRunner: Fn(Payload) + 'static + Send + Sync,
    {
        let job_runner_arc: Arc<JobRunner> = Arc::new(job_runner);

        let (mux_tx, mux_rx) = mpsc::channel();

        let workers: Vec<Worker<Payload>> = (0..size)
            .map(|id| Worker::spawn(id, mux_tx.clone(), job_runner_arc.clone()))
            .collect();

        thread::spawn(move || {
            let mut idle_workers: Vec<WorkerId> = Vec::with_capacity(size);

            'dispatch: loop {
                while idle_workers.is_empty() {
                    match mux_rx.recv() {
                        Ok(WorkerReport {
                            id,
                            status: WorkerStatus::Idle,
                        }) => idle_workers.push(id),
                        Ok(_) => {}
                        Err(err) => {
                            error!("All thread pool workers have stopped: {}", err);
                            return;
                        }
                    }
                }

                match queue_rx.recv() {
                    Ok(Signal::Job(payload)) => {
                        if let Some(worker_id) = idle_workers.pop() {
                            workers[worker_id].run_job(payload);
                        }
                    }
                    Ok(Signal::Terminate) | Err(_) => break 'dispatch,
                }
            }

            for worker in &workers {
                worker.terminate();
            }

            let mut terminated_workers = 0;
            while terminated_workers < size {
                match mux_rx.recv() {
                    Ok(WorkerReport {
                        status: WorkerStatus::Terminated,
                        ..
                    }) => terminated_workers += 1,
                    Ok(_) => {}
                    Err(err) => {
                        error!(
                            "Lost {} thread pool workers during shutdown: {}",
                            size - terminated_workers,
                            err
                        );
                        break;
                    }
                }
            }

            let _ = term_tx.send(());
        });
    }
}

struct Worker<Payload: 'static + Send> {
    id: WorkerId,
    tx: Sender<Signal<Payload>>,
}

impl<Payload: 'static + Send> Worker<Payload> {
    fn spawn<JobRunner>(
        id: WorkerId,
        mux_tx: Sender<WorkerReport>,
        job_runner: Arc<JobRunner>,
    ) -> Worker<Payload>
    where
        JobRunner: Fn(Payload) + 'static + Send + Sync,
    {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            loop {
                let idle = WorkerReport {
                    id,
                    status: WorkerStatus::Idle,
                };
                if mux_tx.send(idle).is_err() {
                    return;
                }

                match rx.recv() {
                    Ok(Signal::Job(payload)) => job_runner(payload),
                    Ok(Signal::Terminate) | Err(_) => break,
                }
            }

            let _ = mux_tx.send(WorkerReport {
                id,
                status: WorkerStatus::Terminated,
            });
        });

        Worker { id, tx }
    }

    fn run_job(&self, payload: Payload) {
        if self.tx.send(Signal::Job(payload)).is_err() {
            error!("Thread pool worker {} has stopped, dropping job", self.id);
        }
    }

    fn terminate(&self) {
        let _ = self.tx.send(Signal::Terminate);
    }
}

enum Signal<Payload: 'static + Send> {
    Terminate,
    Job(Payload),
}

struct WorkerReport {
    id: WorkerId,
    status: WorkerStatus,
}

type WorkerId = usize;

enum WorkerStatus {
    Terminated,
    Idle,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PoolError {
    QueueClosed,
    JoinFailed,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PoolError::QueueClosed => write!(f, "Thread pool job queue is closed"),
            PoolError::JoinFailed => write!(f, "Thread pool stopped before its workers joined"),
        }
    }
}

impl error::Error for PoolError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}
