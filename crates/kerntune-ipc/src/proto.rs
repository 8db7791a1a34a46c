//! Request/response envelopes and the method registry.
//!
//! A request frame is `{"v": .., "request_id": .., "method": "..",
//! "params": {..}}`; the reply echoes `v` and `request_id` and flattens the
//! method's reply object alongside them, so every reply body is a JSON
//! object containing at least `returnValue`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WireError;

pub const PROTOCOL_VERSION: u32 = 1;

/// First frame a client sends after connecting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientHello {
    pub protocol_version: u32,
    pub client_name: String,
    pub client_version: String,
}

/// Daemon's handshake reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloAck {
    pub protocol_version: u32,
    pub daemon_version: String,
    pub max_frame: u32,
}

/// One name/value pair destined for (or read from) a parameter file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamWrite {
    pub name: String,
    pub value: String,
}

/// One enumerated parameter file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    pub writeable: bool,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetValueRequest {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpufreqParamsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCpufreqParamsRequest {
    #[serde(rename = "genericParams")]
    pub generic_params: Vec<ParamWrite>,
    #[serde(rename = "governorParams")]
    pub governor_params: Vec<ParamWrite>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompcacheConfigRequest {
    #[serde(rename = "compcacheConfig")]
    pub compcache_config: Vec<ParamWrite>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetProfilesRequest {
    pub returnid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetProfileRequest {
    pub profileid: i64,
}

/// The method registry. Wire names are kept from the original service so
/// existing callers need no changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum RequestBody {
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "get_proc_cpuinfo")]
    GetProcCpuinfo,
    #[serde(rename = "get_proc_meminfo")]
    GetProcMeminfo,
    #[serde(rename = "get_proc_loadavg")]
    GetProcLoadavg,
    #[serde(rename = "get_cpu_temp")]
    GetCpuTemp,
    #[serde(rename = "get_tcp_congestion_control")]
    GetTcpCongestionControl,
    #[serde(rename = "set_tcp_congestion_control")]
    SetTcpCongestionControl(SetValueRequest),
    #[serde(rename = "get_tcp_allowed_congestion_control")]
    GetTcpAllowedCongestionControl,
    #[serde(rename = "get_tcp_available_congestion_control")]
    GetTcpAvailableCongestionControl,
    #[serde(rename = "get_scaling_cur_freq")]
    GetScalingCurFreq,
    #[serde(rename = "get_scaling_governor")]
    GetScalingGovernor,
    #[serde(rename = "get_cpufreq_params")]
    GetCpufreqParams(CpufreqParamsRequest),
    #[serde(rename = "set_cpufreq_params")]
    SetCpufreqParams(SetCpufreqParamsRequest),
    #[serde(rename = "stick_cpufreq_params")]
    StickCpufreqParams(SetCpufreqParamsRequest),
    #[serde(rename = "unstick_cpufreq_params")]
    UnstickCpufreqParams,
    #[serde(rename = "get_time_in_state")]
    GetTimeInState,
    #[serde(rename = "get_total_trans")]
    GetTotalTrans,
    #[serde(rename = "get_trans_table")]
    GetTransTable,
    #[serde(rename = "get_compcache_config")]
    GetCompcacheConfig,
    #[serde(rename = "set_compcache_config")]
    SetCompcacheConfig(CompcacheConfigRequest),
    #[serde(rename = "stick_compcache_config")]
    StickCompcacheConfig(CompcacheConfigRequest),
    #[serde(rename = "unstick_compcache_config")]
    UnstickCompcacheConfig,
    #[serde(rename = "getProfiles")]
    GetProfiles(GetProfilesRequest),
    #[serde(rename = "setProfile")]
    SetProfile(SetProfileRequest),
}

/// Wire method name, for telemetry.
pub fn method_name(body: &RequestBody) -> &'static str {
    match body {
        RequestBody::Status => "status",
        RequestBody::GetProcCpuinfo => "get_proc_cpuinfo",
        RequestBody::GetProcMeminfo => "get_proc_meminfo",
        RequestBody::GetProcLoadavg => "get_proc_loadavg",
        RequestBody::GetCpuTemp => "get_cpu_temp",
        RequestBody::GetTcpCongestionControl => "get_tcp_congestion_control",
        RequestBody::SetTcpCongestionControl(_) => "set_tcp_congestion_control",
        RequestBody::GetTcpAllowedCongestionControl => "get_tcp_allowed_congestion_control",
        RequestBody::GetTcpAvailableCongestionControl => "get_tcp_available_congestion_control",
        RequestBody::GetScalingCurFreq => "get_scaling_cur_freq",
        RequestBody::GetScalingGovernor => "get_scaling_governor",
        RequestBody::GetCpufreqParams(_) => "get_cpufreq_params",
        RequestBody::SetCpufreqParams(_) => "set_cpufreq_params",
        RequestBody::StickCpufreqParams(_) => "stick_cpufreq_params",
        RequestBody::UnstickCpufreqParams => "unstick_cpufreq_params",
        RequestBody::GetTimeInState => "get_time_in_state",
        RequestBody::GetTotalTrans => "get_total_trans",
        RequestBody::GetTransTable => "get_trans_table",
        RequestBody::GetCompcacheConfig => "get_compcache_config",
        RequestBody::SetCompcacheConfig(_) => "set_compcache_config",
        RequestBody::StickCompcacheConfig(_) => "stick_compcache_config",
        RequestBody::UnstickCompcacheConfig => "unstick_compcache_config",
        RequestBody::GetProfiles(_) => "getProfiles",
        RequestBody::SetProfile(_) => "setProfile",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub v: u32,
    pub request_id: u64,
    #[serde(flatten)]
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: u64,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Err(WireError),
    Ok(ResponseOk),
}

/// Success reply shapes. Untagged: the variants are tried in order, so the
/// ones with discriminating fields come first and the bare ack last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseOk {
    IntValue(IntValueResponse),
    TextValue(TextValueResponse),
    StdOut(StdOutResponse),
    Params(ParamsResponse),
    Ack(AckResponse),
    /// Delegate replies are relayed verbatim.
    Raw(Value),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AckResponse {
    #[serde(rename = "returnValue")]
    pub return_value: bool,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { return_value: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntValueResponse {
    pub value: i64,
    #[serde(rename = "returnValue")]
    pub return_value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextValueResponse {
    pub value: String,
    #[serde(rename = "returnValue")]
    pub return_value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StdOutResponse {
    #[serde(rename = "stdOut")]
    pub std_out: Vec<String>,
    #[serde(rename = "returnValue")]
    pub return_value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamsResponse {
    pub params: Vec<ParamInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governor: Option<String>,
    #[serde(rename = "returnValue")]
    pub return_value: bool,
}
