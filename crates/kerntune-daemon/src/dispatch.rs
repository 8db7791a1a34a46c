use std::sync::Arc;
use std::time::Instant;

use kerntune_core::services::{compcache, cpufreq, proc_info, sticky, tcp};
use kerntune_core::services::error::ServiceError;
use kerntune_ipc::{
    method_name, AckResponse, CompcacheConfigRequest, CpufreqParamsRequest, ErrorCode,
    GetProfilesRequest, IntValueResponse, ParamsResponse, RequestBody, RequestEnvelope,
    ResponseBody, ResponseEnvelope, ResponseOk, SetCpufreqParamsRequest, SetProfileRequest,
    SetValueRequest, StdOutResponse, TextValueResponse, WireError, PROTOCOL_VERSION,
};
use tokio::task;

use crate::appmgr;
use crate::auth::PeerCred;
use crate::state::DaemonState;
use crate::telemetry::log_request;
use crate::validation;

pub async fn handle_request(
    state: &Arc<DaemonState>,
    request: RequestEnvelope,
    peer: PeerCred,
) -> ResponseEnvelope {
    let start = Instant::now();
    let method = method_name(&request.body);

    let response_body = match request.body {
        RequestBody::Status => ResponseBody::Ok(ResponseOk::Ack(AckResponse::ok())),
        RequestBody::GetProcCpuinfo => std_out(proc_info::cpuinfo(&state.paths)),
        RequestBody::GetProcMeminfo => std_out(proc_info::meminfo(&state.paths)),
        RequestBody::GetProcLoadavg => std_out(proc_info::loadavg(&state.paths)),
        RequestBody::GetCpuTemp => int_value(proc_info::cpu_temp(&state.paths)),
        RequestBody::GetTcpCongestionControl => std_out(tcp::congestion_control(&state.paths)),
        RequestBody::SetTcpCongestionControl(SetValueRequest { value }) => {
            match validation::validate_value("value", &value) {
                Ok(()) => ack(tcp::set_congestion_control(&state.paths, &value)),
                Err(err) => ResponseBody::Err(err),
            }
        }
        RequestBody::GetTcpAllowedCongestionControl => {
            std_out(tcp::allowed_congestion_control(&state.paths))
        }
        RequestBody::GetTcpAvailableCongestionControl => {
            std_out(tcp::available_congestion_control(&state.paths))
        }
        RequestBody::GetScalingCurFreq => int_value(cpufreq::scaling_cur_freq(&state.paths)),
        RequestBody::GetScalingGovernor => text_value(cpufreq::scaling_governor(&state.paths)),
        RequestBody::GetCpufreqParams(CpufreqParamsRequest { governor }) => {
            match cpufreq::get_params(&state.paths, governor.as_deref()) {
                Ok(params) => ResponseBody::Ok(ResponseOk::Params(ParamsResponse {
                    params,
                    governor,
                    return_value: true,
                })),
                Err(err) => ResponseBody::Err(err.to_wire_error()),
            }
        }
        RequestBody::SetCpufreqParams(req) => match validate_cpufreq_request(&req) {
            Ok(()) => ack(cpufreq::set_params(
                &state.paths,
                &req.generic_params,
                &req.governor_params,
            )),
            Err(err) => ResponseBody::Err(err),
        },
        RequestBody::StickCpufreqParams(req) => match validate_cpufreq_request(&req) {
            Ok(()) => ack(sticky::write_cpufreq_script(
                &state.paths,
                &req.generic_params,
                &req.governor_params,
            )),
            Err(err) => ResponseBody::Err(err),
        },
        RequestBody::UnstickCpufreqParams => ack(sticky::remove_cpufreq_script(&state.paths)),
        RequestBody::GetTimeInState => std_out(cpufreq::time_in_state(&state.paths)),
        RequestBody::GetTotalTrans => std_out(cpufreq::total_trans(&state.paths)),
        RequestBody::GetTransTable => std_out(cpufreq::trans_table(&state.paths)),
        RequestBody::GetCompcacheConfig => {
            match compcache::probe(&state.paths) {
                Ok(compcache_state) => ResponseBody::Ok(ResponseOk::Params(ParamsResponse {
                    params: compcache::config_params(&compcache_state),
                    governor: None,
                    return_value: true,
                })),
                Err(err) => ResponseBody::Err(err.to_wire_error()),
            }
        }
        RequestBody::SetCompcacheConfig(CompcacheConfigRequest { compcache_config }) => {
            match validation::parse_compcache_config(&compcache_config) {
                Ok(parsed) => {
                    // Module loads and swap moves take seconds; keep them off
                    // the accept loop.
                    let paths = state.paths.clone();
                    let result = task::spawn_blocking(move || {
                        compcache::set_config(&paths, parsed.enable, &parsed.memlimit_kb)
                    })
                    .await;
                    match result {
                        Ok(outcome) => ack(outcome),
                        Err(err) => ResponseBody::Err(WireError::new(
                            ErrorCode::Internal,
                            format!("Compcache reconfigure panicked: {err}"),
                        )),
                    }
                }
                Err(err) => ResponseBody::Err(err),
            }
        }
        RequestBody::StickCompcacheConfig(CompcacheConfigRequest { compcache_config }) => {
            match validation::parse_compcache_config(&compcache_config) {
                Ok(parsed) if parsed.enable => {
                    ack(sticky::write_compcache_script(&state.paths, &parsed.memlimit_kb))
                }
                Ok(_) => ack(sticky::remove_compcache_script(&state.paths)),
                Err(err) => ResponseBody::Err(err),
            }
        }
        RequestBody::UnstickCompcacheConfig => {
            ack(sticky::remove_compcache_script(&state.paths))
        }
        RequestBody::GetProfiles(GetProfilesRequest { returnid }) => {
            match appmgr::get_profiles(&state.config.appmgr_socket, &returnid).await {
                Ok(value) => ResponseBody::Ok(ResponseOk::Raw(value)),
                Err(err) => ResponseBody::Err(err),
            }
        }
        RequestBody::SetProfile(SetProfileRequest { profileid }) => {
            match appmgr::set_profile(&state.config.appmgr_socket, profileid).await {
                Ok(value) => ResponseBody::Ok(ResponseOk::Raw(value)),
                Err(err) => ResponseBody::Err(err),
            }
        }
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    log_request(request.request_id, method, peer, duration_ms, &response_body);

    ResponseEnvelope {
        v: PROTOCOL_VERSION,
        request_id: request.request_id,
        body: response_body,
    }
}

fn validate_cpufreq_request(req: &SetCpufreqParamsRequest) -> Result<(), WireError> {
    validation::validate_param_writes("genericParams", &req.generic_params)?;
    validation::validate_param_writes("governorParams", &req.governor_params)
}

fn ack(result: Result<(), ServiceError>) -> ResponseBody {
    match result {
        Ok(()) => ResponseBody::Ok(ResponseOk::Ack(AckResponse::ok())),
        Err(err) => ResponseBody::Err(err.to_wire_error()),
    }
}

fn std_out(result: Result<Vec<String>, ServiceError>) -> ResponseBody {
    match result {
        Ok(lines) => ResponseBody::Ok(ResponseOk::StdOut(StdOutResponse {
            std_out: lines,
            return_value: true,
        })),
        Err(err) => ResponseBody::Err(err.to_wire_error()),
    }
}

fn int_value(result: Result<i64, ServiceError>) -> ResponseBody {
    match result {
        Ok(value) => ResponseBody::Ok(ResponseOk::IntValue(IntValueResponse {
            value,
            return_value: true,
        })),
        Err(err) => ResponseBody::Err(err.to_wire_error()),
    }
}

fn text_value(result: Result<String, ServiceError>) -> ResponseBody {
    match result {
        Ok(value) => ResponseBody::Ok(ResponseOk::TextValue(TextValueResponse {
            value,
            return_value: true,
        })),
        Err(err) => ResponseBody::Err(err.to_wire_error()),
    }
}
