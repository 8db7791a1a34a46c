use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use kerntune_ipc::{
    ClientHello, CompcacheConfigRequest, CpufreqParamsRequest, ErrorCode, GetProfilesRequest,
    HelloAck, ParamWrite, ParamsResponse, RequestBody, RequestEnvelope, ResponseBody,
    ResponseEnvelope, ResponseOk, SetCpufreqParamsRequest, SetProfileRequest, SetValueRequest,
    WireError, MAX_FRAME, PROTOCOL_VERSION,
};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::{sleep, timeout};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
// Compcache reconfiguration moves swap devices and sleeps while the
// compressed device settles.
const LONG_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_RETRY_ATTEMPTS: u32 = 3;
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct DaemonClientInfo {
    pub daemon_version: String,
    pub protocol_version: u32,
    pub max_frame: u32,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub socket_path: PathBuf,
    pub client_name: String,
    pub client_version: String,
    pub request_timeout: Duration,
    pub long_request_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/run/kerntune/kerntuned.sock"),
            client_name: "kerntune-client".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            long_request_timeout: LONG_REQUEST_TIMEOUT,
            max_retries: MAX_RETRY_ATTEMPTS,
            retry_delay_ms: INITIAL_RETRY_DELAY.as_millis() as u64,
        }
    }
}

pub struct DaemonClient {
    stream: Option<UnixStream>,
    next_request_id: AtomicU64,
    info: Option<DaemonClientInfo>,
    config: ClientConfig,
}

impl DaemonClient {
    pub async fn connect<P: AsRef<Path>>(
        path: P,
        client_name: &str,
        client_version: &str,
    ) -> Result<Self> {
        let config = ClientConfig {
            socket_path: path.as_ref().to_path_buf(),
            client_name: client_name.to_string(),
            client_version: client_version.to_string(),
            ..Default::default()
        };
        Self::connect_with_config(config).await
    }

    pub async fn connect_with_config(config: ClientConfig) -> Result<Self> {
        let mut client = Self {
            stream: None,
            next_request_id: AtomicU64::new(1),
            info: None,
            config,
        };
        client.reconnect().await?;
        Ok(client)
    }

    async fn reconnect(&mut self) -> Result<()> {
        let mut stream = UnixStream::connect(&self.config.socket_path)
            .await
            .with_context(|| format!("connecting to {}", self.config.socket_path.display()))?;

        let hello = ClientHello {
            protocol_version: PROTOCOL_VERSION,
            client_name: self.config.client_name.clone(),
            client_version: self.config.client_version.clone(),
        };
        let hello_bytes = serde_json::to_vec(&hello)?;
        write_frame(&mut stream, &hello_bytes, MAX_FRAME).await?;

        let ack_bytes = timeout(HANDSHAKE_TIMEOUT, read_frame(&mut stream, MAX_FRAME))
            .await
            .context("handshake timed out")??;
        let ack: HelloAck = serde_json::from_slice(&ack_bytes)?;
        if ack.protocol_version != PROTOCOL_VERSION {
            bail!(
                "protocol mismatch: client={} daemon={}",
                PROTOCOL_VERSION,
                ack.protocol_version
            );
        }

        self.info = Some(DaemonClientInfo {
            daemon_version: ack.daemon_version,
            protocol_version: ack.protocol_version,
            max_frame: ack.max_frame,
        });
        self.stream = Some(stream);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn info(&self) -> Option<&DaemonClientInfo> {
        self.info.as_ref()
    }

    pub async fn ensure_connected(&mut self) -> Result<()> {
        if !self.is_connected() {
            self.reconnect().await?;
        }
        Ok(())
    }

    pub async fn request(&mut self, body: RequestBody) -> Result<ResponseBody> {
        self.request_with_timeout(body, self.config.request_timeout)
            .await
    }

    pub async fn request_long(&mut self, body: RequestBody) -> Result<ResponseBody> {
        self.request_with_timeout(body, self.config.long_request_timeout)
            .await
    }

    pub async fn request_with_timeout(
        &mut self,
        body: RequestBody,
        req_timeout: Duration,
    ) -> Result<ResponseBody> {
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.config.max_retries {
            if attempts > 0 {
                let delay = Duration::from_millis(
                    self.config.retry_delay_ms * (1u64 << (attempts - 1).min(4)),
                );
                sleep(delay).await;
            }

            match self.try_request(&body, req_timeout).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    let should_retry = is_retryable_error(&err);
                    last_error = Some(err);

                    if !should_retry {
                        break;
                    }

                    attempts += 1;

                    if attempts < self.config.max_retries {
                        self.stream = None;
                        if let Err(err) = self.reconnect().await {
                            last_error = Some(err);
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("request failed with no error")))
    }

    async fn try_request(
        &mut self,
        body: &RequestBody,
        req_timeout: Duration,
    ) -> Result<ResponseBody> {
        self.ensure_connected().await?;

        let stream = self.stream.as_mut().ok_or_else(|| anyhow!("not connected"))?;
        let info = self.info.as_ref().ok_or_else(|| anyhow!("no info"))?;

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let envelope = RequestEnvelope {
            v: info.protocol_version,
            request_id,
            body: body.clone(),
        };
        let payload = serde_json::to_vec(&envelope)?;
        write_frame(stream, &payload, info.max_frame).await?;

        let response_bytes = timeout(req_timeout, read_frame(stream, info.max_frame))
            .await
            .context("response timed out")??;
        let response: ResponseEnvelope = serde_json::from_slice(&response_bytes)?;
        if response.request_id != request_id {
            bail!(
                "response request_id mismatch: expected {} got {}",
                request_id,
                response.request_id
            );
        }
        if response.v != info.protocol_version {
            bail!(
                "protocol version mismatch: expected {} got {}",
                info.protocol_version,
                response.v
            );
        }
        Ok(response.body)
    }

    pub async fn status(&mut self) -> Result<()> {
        self.ack_request(RequestBody::Status).await
    }

    pub async fn proc_cpuinfo(&mut self) -> Result<Vec<String>> {
        self.std_out_request(RequestBody::GetProcCpuinfo).await
    }

    pub async fn proc_meminfo(&mut self) -> Result<Vec<String>> {
        self.std_out_request(RequestBody::GetProcMeminfo).await
    }

    pub async fn proc_loadavg(&mut self) -> Result<Vec<String>> {
        self.std_out_request(RequestBody::GetProcLoadavg).await
    }

    pub async fn cpu_temp(&mut self) -> Result<i64> {
        self.int_request(RequestBody::GetCpuTemp).await
    }

    pub async fn tcp_congestion_control(&mut self) -> Result<Vec<String>> {
        self.std_out_request(RequestBody::GetTcpCongestionControl)
            .await
    }

    pub async fn set_tcp_congestion_control(&mut self, value: &str) -> Result<()> {
        self.ack_request(RequestBody::SetTcpCongestionControl(SetValueRequest {
            value: value.to_string(),
        }))
        .await
    }

    pub async fn tcp_allowed_congestion_control(&mut self) -> Result<Vec<String>> {
        self.std_out_request(RequestBody::GetTcpAllowedCongestionControl)
            .await
    }

    pub async fn tcp_available_congestion_control(&mut self) -> Result<Vec<String>> {
        self.std_out_request(RequestBody::GetTcpAvailableCongestionControl)
            .await
    }

    pub async fn scaling_cur_freq(&mut self) -> Result<i64> {
        self.int_request(RequestBody::GetScalingCurFreq).await
    }

    pub async fn scaling_governor(&mut self) -> Result<String> {
        match self.request(RequestBody::GetScalingGovernor).await? {
            ResponseBody::Ok(ResponseOk::TextValue(resp)) => Ok(resp.value),
            ResponseBody::Err(err) => Err(wire_error(err)),
            _ => Err(anyhow!("unexpected response body")),
        }
    }

    pub async fn cpufreq_params(&mut self, governor: Option<&str>) -> Result<ParamsResponse> {
        let body = RequestBody::GetCpufreqParams(CpufreqParamsRequest {
            governor: governor.map(str::to_string),
        });
        self.params_request(body).await
    }

    pub async fn set_cpufreq_params(
        &mut self,
        generic_params: Vec<ParamWrite>,
        governor_params: Vec<ParamWrite>,
    ) -> Result<()> {
        self.ack_request(RequestBody::SetCpufreqParams(SetCpufreqParamsRequest {
            generic_params,
            governor_params,
        }))
        .await
    }

    pub async fn stick_cpufreq_params(
        &mut self,
        generic_params: Vec<ParamWrite>,
        governor_params: Vec<ParamWrite>,
    ) -> Result<()> {
        self.ack_request(RequestBody::StickCpufreqParams(SetCpufreqParamsRequest {
            generic_params,
            governor_params,
        }))
        .await
    }

    pub async fn unstick_cpufreq_params(&mut self) -> Result<()> {
        self.ack_request(RequestBody::UnstickCpufreqParams).await
    }

    pub async fn time_in_state(&mut self) -> Result<Vec<String>> {
        self.std_out_request(RequestBody::GetTimeInState).await
    }

    pub async fn total_trans(&mut self) -> Result<Vec<String>> {
        self.std_out_request(RequestBody::GetTotalTrans).await
    }

    pub async fn trans_table(&mut self) -> Result<Vec<String>> {
        self.std_out_request(RequestBody::GetTransTable).await
    }

    pub async fn compcache_config(&mut self) -> Result<ParamsResponse> {
        self.params_request(RequestBody::GetCompcacheConfig).await
    }

    pub async fn set_compcache_config(&mut self, entries: Vec<ParamWrite>) -> Result<()> {
        let body = RequestBody::SetCompcacheConfig(CompcacheConfigRequest {
            compcache_config: entries,
        });
        match self.request_long(body).await? {
            ResponseBody::Ok(ResponseOk::Ack(_)) => Ok(()),
            ResponseBody::Err(err) => Err(wire_error(err)),
            _ => Err(anyhow!("unexpected response body")),
        }
    }

    pub async fn stick_compcache_config(&mut self, entries: Vec<ParamWrite>) -> Result<()> {
        self.ack_request(RequestBody::StickCompcacheConfig(CompcacheConfigRequest {
            compcache_config: entries,
        }))
        .await
    }

    pub async fn unstick_compcache_config(&mut self) -> Result<()> {
        self.ack_request(RequestBody::UnstickCompcacheConfig).await
    }

    pub async fn get_profiles(&mut self, returnid: &str) -> Result<Value> {
        let body = RequestBody::GetProfiles(GetProfilesRequest {
            returnid: returnid.to_string(),
        });
        self.raw_request(body).await
    }

    pub async fn set_profile(&mut self, profileid: i64) -> Result<Value> {
        self.raw_request(RequestBody::SetProfile(SetProfileRequest { profileid }))
            .await
    }

    async fn ack_request(&mut self, body: RequestBody) -> Result<()> {
        match self.request(body).await? {
            ResponseBody::Ok(ResponseOk::Ack(_)) => Ok(()),
            ResponseBody::Err(err) => Err(wire_error(err)),
            _ => Err(anyhow!("unexpected response body")),
        }
    }

    async fn std_out_request(&mut self, body: RequestBody) -> Result<Vec<String>> {
        match self.request(body).await? {
            ResponseBody::Ok(ResponseOk::StdOut(resp)) => Ok(resp.std_out),
            ResponseBody::Err(err) => Err(wire_error(err)),
            _ => Err(anyhow!("unexpected response body")),
        }
    }

    async fn int_request(&mut self, body: RequestBody) -> Result<i64> {
        match self.request(body).await? {
            ResponseBody::Ok(ResponseOk::IntValue(resp)) => Ok(resp.value),
            ResponseBody::Err(err) => Err(wire_error(err)),
            _ => Err(anyhow!("unexpected response body")),
        }
    }

    async fn params_request(&mut self, body: RequestBody) -> Result<ParamsResponse> {
        match self.request(body).await? {
            ResponseBody::Ok(ResponseOk::Params(resp)) => Ok(resp),
            ResponseBody::Err(err) => Err(wire_error(err)),
            _ => Err(anyhow!("unexpected response body")),
        }
    }

    async fn raw_request(&mut self, body: RequestBody) -> Result<Value> {
        match self.request(body).await? {
            ResponseBody::Ok(ResponseOk::Raw(value)) => Ok(value),
            ResponseBody::Ok(other) => {
                serde_json::to_value(&other).context("reserializing delegate reply")
            }
            ResponseBody::Err(err) => Err(wire_error(err)),
        }
    }
}

fn wire_error(err: WireError) -> anyhow::Error {
    anyhow!(err.text.clone()).context(match err.code {
        Some(ErrorCode::BadRequest) => "bad request",
        Some(ErrorCode::Io) => "io",
        Some(ErrorCode::CommandFailed) => "command failed",
        Some(ErrorCode::NotFound) => "not found",
        Some(ErrorCode::Delegate) => "delegate",
        Some(ErrorCode::Internal) => "internal",
        None => "expected failure",
    })
}

fn is_retryable_error(err: &anyhow::Error) -> bool {
    if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
        matches!(
            io_err.kind(),
            std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::Interrupted
        )
    } else {
        err.to_string().contains("timed out") || err.to_string().contains("connection")
    }
}

async fn read_frame(stream: &mut UnixStream, max_frame: u32) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = kerntune_ipc::decode_frame_length(len_buf, max_frame)
        .map_err(|err| anyhow!("invalid frame length: {err}"))?;
    let mut buf = vec![0u8; len as usize];
    stream.read_exact(&mut buf).await?;
    Ok(buf)
}

async fn write_frame(stream: &mut UnixStream, payload: &[u8], max_frame: u32) -> Result<()> {
    if payload.is_empty() {
        bail!("empty payload");
    }
    if payload.len() as u32 > max_frame {
        bail!("payload exceeds max_frame");
    }
    let frame = kerntune_ipc::encode_frame(payload);
    stream.write_all(&frame).await?;
    Ok(())
}
