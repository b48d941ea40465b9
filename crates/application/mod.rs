pub mod dispatch_locks;
pub mod usecases;
