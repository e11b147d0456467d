//! DB operation interface logic, generating database operation shims.
//!
//! The [`inst_ops!`] macro manages the indirection required to spawn requests
//! onto a shared thread pool for async callers while letting synchronous
//! callers execute the same operation in place.  For each declared method it
//! generates `_async`, `_blocking` and `_chan` variants.

/// Handle for receiving a result from a database operation.
pub type DbRecv<T> = tokio::sync::oneshot::Receiver<stela_db::DbResult<T>>;

/// Generates an `Ops` interface with shim functions for the operations of a
/// database trait.
///
/// ### Usage
/// ```ignore
/// inst_ops! {
///     (<D: ChainDatabase> => ChainDataOps) {
///         set_canonical_chain_entry(height: u64, blockid: L1BlockId) => ();
///         get_canonical_chain_tip() => Option<(u64, L1BlockId)>;
///     }
/// }
/// ```
///
/// - **Database trait**: the trait bound for the database (e.g. `ChainDatabase`)
/// - **Ops struct name**: the name of the generated operations struct
/// - **Methods**: each operation with its inputs and output
///
/// For each method `foo(arg: Type) => Ret` the macro generates:
/// - `foo_async(&self, arg: Type) -> DbResult<Ret>` — runs on the pool
/// - `foo_blocking(&self, arg: Type) -> DbResult<Ret>` — runs in place
/// - `foo_chan(&self, arg: Type) -> DbRecv<Ret>` — returns the response handle
#[macro_export]
macro_rules! inst_ops {
    {
        (<$tparam:ident: $tpconstr:tt> => $base:ident) {
            $($iname:ident($($aname:ident: $aty:ty),*) => $ret:ty;)*
        }
    } => {
        /// Context wrapping the database the generated shims execute against.
        #[derive(Debug)]
        pub struct Context<$tparam: $tpconstr> {
            db: ::std::sync::Arc<$tparam>,
        }

        impl<$tparam: $tpconstr + Sync + Send + 'static> Context<$tparam> {
            pub fn new(db: ::std::sync::Arc<$tparam>) -> Self {
                Self { db }
            }

            pub fn into_ops(self, pool: $crate::threadpool::ThreadPool) -> $base {
                $base::new(pool, ::std::sync::Arc::new(self))
            }
        }

        #[expect(
            missing_debug_implementations,
            reason = "some inner types don't have Debug implementations"
        )]
        pub struct $base {
            pool: $crate::threadpool::ThreadPool,
            inner: ::std::sync::Arc<dyn ShimTrait>,
        }

        $crate::paste::paste! {
            impl $base {
                fn new<$tparam: $tpconstr + Sync + Send + 'static>(
                    pool: $crate::threadpool::ThreadPool,
                    ctx: ::std::sync::Arc<Context<$tparam>>,
                ) -> Self {
                    Self {
                        pool,
                        inner: ::std::sync::Arc::new(Inner { ctx }),
                    }
                }

                $(
                    pub async fn [<$iname _async>](&self, $($aname: $aty),*) -> $crate::stela_db::DbResult<$ret> {
                        let resp_rx = self.inner.[<$iname _chan>](&self.pool, $($aname),*);
                        match resp_rx.await {
                            Ok(v) => v,
                            Err(_e) => Err($crate::stela_db::DbError::WorkerFailedStrangely),
                        }
                    }

                    pub fn [<$iname _blocking>](&self, $($aname: $aty),*) -> $crate::stela_db::DbResult<$ret> {
                        self.inner.[<$iname _blocking>]($($aname),*)
                    }

                    pub fn [<$iname _chan>](&self, $($aname: $aty),*) -> $crate::exec::DbRecv<$ret> {
                        self.inner.[<$iname _chan>](&self.pool, $($aname),*)
                    }
                )*
            }

            trait ShimTrait: Sync + Send + 'static {
                $(
                    fn [<$iname _blocking>](&self, $($aname: $aty),*) -> $crate::stela_db::DbResult<$ret>;
                    fn [<$iname _chan>](&self, pool: &$crate::threadpool::ThreadPool, $($aname: $aty),*) -> $crate::exec::DbRecv<$ret>;
                )*
            }

            struct Inner<$tparam: $tpconstr + Sync + Send + 'static> {
                ctx: ::std::sync::Arc<Context<$tparam>>,
            }

            impl<$tparam: $tpconstr + Sync + Send + 'static> ShimTrait for Inner<$tparam> {
                $(
                    fn [<$iname _blocking>](&self, $($aname: $aty),*) -> $crate::stela_db::DbResult<$ret> {
                        self.ctx.db.$iname($($aname),*)
                    }

                    fn [<$iname _chan>](&self, pool: &$crate::threadpool::ThreadPool, $($aname: $aty),*) -> $crate::exec::DbRecv<$ret> {
                        let (resp_tx, resp_rx) = $crate::tokio::sync::oneshot::channel();
                        let ctx = self.ctx.clone();

                        pool.execute(move || {
                            let res = ctx.db.$iname($($aname),*);
                            if resp_tx.send(res).is_err() {
                                $crate::tracing::warn!("failed to send response");
                            }
                        });

                        resp_rx
                    }
                )*
            }
        }
    }
}
