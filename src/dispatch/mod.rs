//! Task dispatch: the queue between the submission path and the workers.
//!
//! [`TaskDispatcher`] enqueues work (fire-and-forget); [`WorkerPool`] pulls
//! it off and drives the pipeline runner under the [`RetryPolicy`];
//! [`Reconciler`] sweeps up jobs whose execution was lost.  The [`InFlight`]
//! guard keeps executions at most one per job at a time.

pub mod dispatcher;
pub mod reconcile;
pub mod task;
pub mod worker;

pub use dispatcher::{
    task_queue, DispatchError, InFlight, RetryPolicy, SharedTaskReceiver, TaskDispatcher,
};
pub use reconcile::Reconciler;
pub use task::{DispatchAck, Task};
pub use worker::WorkerPool;
