//! MCP server loop for the weather tools.
//!
//! One reader pulls frames from the transport and decodes them. Each
//! request then runs in its own task, so a slow upstream call never holds
//! up the next frame. Responses go out through a shared [`ResponseSink`]
//! in whatever order the handlers finish; every response carries the ID of
//! the request it answers.
//!
//! # Shutdown
//!
//! - End of input: handlers still in flight are aborted and the loop
//!   returns `Ok`.
//! - Client gone (write fails with a disconnect): the loop returns `Ok`.
//! - SIGINT/SIGTERM (Ctrl+C on Windows): the loop returns `Ok`.
//! - Fatal framing or I/O error: the loop returns the error.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::{AbortHandle, JoinSet};
use tracing::{error, info, warn};

use crate::error::TransportError;
use crate::mcp::dispatch::Dispatcher;
use crate::mcp::protocol::{JsonRpcError, JsonRpcRequest};
use crate::mcp::transport::{self, FrameReader, ResponseSink};

/// The MCP weather server.
pub struct McpServer {
    /// Request router shared with every handler task.
    dispatcher: Dispatcher,
    /// Largest accepted incoming frame.
    max_frame_bytes: usize,
}

impl McpServer {
    /// Creates a new server.
    #[must_use]
    pub const fn new(dispatcher: Dispatcher, max_frame_bytes: usize) -> Self {
        Self {
            dispatcher,
            max_frame_bytes,
        }
    }

    /// Runs the server over stdin/stdout until input ends or a shutdown
    /// signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error on a fatal framing error or transport I/O failure.
    pub async fn run(&self) -> Result<(), TransportError> {
        let (reader, sink) = transport::stdio(self.max_frame_bytes);
        self.run_with_shutdown(reader, sink).await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown<R, W>(
        &self,
        reader: FrameReader<R>,
        sink: ResponseSink<W>,
    ) -> Result<(), TransportError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, initiating graceful shutdown");
                Ok(())
            }

            _ = sigterm.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown");
                Ok(())
            }

            result = self.serve(reader, sink) => result,
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown<R, W>(
        &self,
        reader: FrameReader<R>,
        sink: ResponseSink<W>,
    ) -> Result<(), TransportError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, initiating graceful shutdown");
                Ok(())
            }

            result = self.serve(reader, sink) => result,
        }
    }

    /// Serves requests from `reader`, answering through `sink`.
    ///
    /// Returns when input ends or the client disconnects. Dropping the
    /// returned future aborts every in-flight handler.
    ///
    /// # Errors
    ///
    /// Returns an error on a fatal framing error or a write failure other
    /// than a disconnect.
    pub async fn serve<R, W>(
        &self,
        mut reader: FrameReader<R>,
        sink: ResponseSink<W>,
    ) -> Result<(), TransportError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut tasks: JoinSet<Result<(), TransportError>> = JoinSet::new();

        loop {
            tokio::select! {
                frame = reader.read_message() => match frame {
                    Ok(Some(line)) => {
                        if let Err(e) = self.accept(&line, &sink, &mut tasks).await {
                            return finish_on_write_error(e, &mut tasks);
                        }
                    }
                    Ok(None) => {
                        info!(in_flight = tasks.len(), "End of input, shutting down");
                        tasks.abort_all();
                        return Ok(());
                    }
                    Err(e) if e.is_disconnect() => {
                        info!("Client disconnected");
                        tasks.abort_all();
                        return Ok(());
                    }
                    Err(e) => {
                        error!(error = %e, "Fatal transport error");
                        tasks.abort_all();
                        return Err(e);
                    }
                },

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => return finish_on_write_error(e, &mut tasks),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => error!(error = %e, "Request task failed"),
                },
            }
        }
    }

    /// Decodes one frame. Requests are handed to a new task; parse errors
    /// are answered immediately.
    async fn accept<W>(
        &self,
        line: &str,
        sink: &ResponseSink<W>,
        tasks: &mut JoinSet<Result<(), TransportError>>,
    ) -> Result<(), TransportError>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        match self.dispatcher.decode(line) {
            Ok(Some(req)) => {
                self.spawn_request(req, sink.clone(), tasks);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(rejection) => sink.send(&rejection).await,
        }
    }

    /// Runs one request to completion and writes its response.
    ///
    /// The handler runs in a task of its own so that a panic surfaces as a
    /// `JoinError` and is answered with an internal error for that request.
    fn spawn_request<W>(
        &self,
        req: JsonRpcRequest,
        sink: ResponseSink<W>,
        tasks: &mut JoinSet<Result<(), TransportError>>,
    ) where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let dispatcher = self.dispatcher.clone();

        tasks.spawn(async move {
            let id = req.id.clone();
            let method = req.method.clone();

            let handler = tokio::spawn(async move { dispatcher.handle_request(req).await });
            let _guard = AbortOnDrop(handler.abort_handle());

            let message = match handler.await {
                Ok(message) => message,
                Err(e) => {
                    error!(id = %id, method = %method, panic = e.is_panic(), "Request handler failed");
                    JsonRpcError::internal_error(id).into()
                }
            };

            sink.send(&message).await
        });
    }
}

/// Aborts a task when dropped, so aborting the outer request task also
/// stops its handler.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn finish_on_write_error(
    e: TransportError,
    tasks: &mut JoinSet<Result<(), TransportError>>,
) -> Result<(), TransportError> {
    tasks.abort_all();
    if e.is_disconnect() {
        info!("Client disconnected, shutting down");
        Ok(())
    } else {
        warn!(error = %e, "Failed to write response");
        Err(e)
    }
}
