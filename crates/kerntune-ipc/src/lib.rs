//! Wire protocol shared between the kerntune daemon and its clients.

mod error;
mod escape;
mod frame;
mod proto;

pub use error::{ErrorCode, WireError};
pub use escape::{escape_str, escape_text};
pub use frame::{decode_frame_length, encode_frame, FrameError, MAX_FRAME};
pub use proto::{
    method_name, AckResponse, ClientHello, CompcacheConfigRequest, CpufreqParamsRequest,
    GetProfilesRequest, HelloAck, IntValueResponse, ParamInfo, ParamWrite, ParamsResponse,
    RequestBody, RequestEnvelope, ResponseBody, ResponseEnvelope, ResponseOk,
    SetCpufreqParamsRequest, SetProfileRequest, SetValueRequest, StdOutResponse,
    TextValueResponse, PROTOCOL_VERSION,
};
