use super::*;

    const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

    /// `POST`/`GET` against `<api_base_url>plugin/<plugin_id>`, relying on the
    /// host page's session cookie for auth.
    pub(super) struct HttpCommandTransport {
        endpoint: String,
        timeout_ms: Option<u32>,
    }

    impl HttpCommandTransport {
        pub(super) fn new(endpoint: String, timeout_ms: Option<u32>) -> Self {
            Self {
                endpoint,
                timeout_ms,
            }
        }
    }

    #[async_trait(?Send)]
    impl CommandTransport for HttpCommandTransport {
        async fn send_command(
            &self,
            request: &CommandRequest,
        ) -> Result<CommandResponse, CommandError> {
            let body = serde_json::to_string(request).map_err(|error| CommandError::Decode {
                message: format!("failed to serialize request body: {error}"),
            })?;
            tracing::debug!(command = request.name(), endpoint = %self.endpoint, "sending plugin command");
            let request = Request::post(&self.endpoint)
                .header("content-type", JSON_CONTENT_TYPE)
                .body(body)
                .map_err(|error| CommandError::Transport {
                    message: format!("failed to build request body: {error}"),
                })?;

            with_timeout(self.timeout_ms, async move {
                let response = request.send().await.map_err(map_network_error)?;
                decode_json_response(response).await
            })
            .await
        }

        async fn fetch_snapshot(&self) -> Result<Snapshot, CommandError> {
            let request = Request::get(&self.endpoint);
            with_timeout(self.timeout_ms, async move {
                let response = request.send().await.map_err(map_network_error)?;
                decode_json_response(response).await
            })
            .await
        }
    }

    pub(super) async fn decode_json_response<T: for<'de> serde::Deserialize<'de>>(
        response: gloo_net::http::Response,
    ) -> Result<T, CommandError> {
        let status = response.status();
        let raw = response.text().await.map_err(|error| CommandError::Transport {
            message: error.to_string(),
        })?;
        decode_response_body(status, &raw)
    }

    fn map_network_error(error: gloo_net::Error) -> CommandError {
        CommandError::Transport {
            message: error.to_string(),
        }
    }

    async fn with_timeout<T>(
        timeout_ms: Option<u32>,
        operation: impl Future<Output = Result<T, CommandError>>,
    ) -> Result<T, CommandError> {
        let Some(timeout_ms) = timeout_ms else {
            return operation.await;
        };

        let operation = operation.fuse();
        let timeout = sleep(Duration::from_millis(u64::from(timeout_ms))).fuse();
        pin_mut!(operation, timeout);
        select! {
            result = operation => result,
            () = timeout => Err(CommandError::Timeout {
                after_ms: u64::from(timeout_ms),
            }),
        }
    }
