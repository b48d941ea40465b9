pub mod dispatch_loop;
