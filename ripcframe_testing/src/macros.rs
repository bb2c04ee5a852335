//! Assertion macros shared by integration tests.

/// Await a channel read and panic with contextual diagnostics on failure.
#[macro_export]
macro_rules! read_expect {
    ($fut:expr) => {{
        $fut.await
            .expect(concat!("read failed at ", file!(), ":", line!()))
    }};
    ($fut:expr, $msg:expr) => {{
        let m = ::std::format!("{msg} at {}:{}", file!(), line!(), msg = $msg);
        $fut.await.expect(&m)
    }};
}

/// Await a channel flush and panic with contextual diagnostics on failure.
#[macro_export]
macro_rules! flush_expect {
    ($channel:expr) => {{
        $channel
            .flush()
            .await
            .expect(concat!("flush failed at ", file!(), ":", line!()))
    }};
}

pub use crate::{flush_expect, read_expect};
