//! Per-operation option shapes passed through to the SDK

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Extra SIP header sent with a call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomHeader {
    pub name: String,
    pub value: String,
}

/// Preferred codec entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpCodecCapability {
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_fmtp_line: Option<String>,
}

/// SDP bandwidth settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSettings {
    #[serde(
        rename = "sdpASBandwidthKbps",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_as_bandwidth_kbps: Option<u32>,
    #[serde(
        rename = "useSdpASBandwidthKbps",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub use_sdp_as_bandwidth_kbps: Option<bool>,
}

fn default_true() -> bool {
    true
}

/// Options for placing an outbound call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_caller_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_caller_number: Option<String>,
    #[serde(default = "default_true")]
    pub audio: bool,
    #[serde(default)]
    pub video: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_stereo: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attach: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_share: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mic_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cam_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cam_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negotiate_audio: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negotiate_video: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_max_bitrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_min_bitrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_start_bitrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_settings: Option<MediaSettings>,
    #[serde(
        rename = "preferred_codecs",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub preferred_codecs: Vec<RtpCodecCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_output: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub user_variables: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_headers: Vec<CustomHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telnyx_call_control_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telnyx_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telnyx_leg_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefetch_ice_candidates: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_relay_candidate: Option<bool>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            destination_number: None,
            caller_name: None,
            caller_number: None,
            remote_caller_name: None,
            remote_caller_number: None,
            audio: true,
            video: false,
            use_stereo: None,
            attach: None,
            screen_share: None,
            local_element: None,
            remote_element: None,
            mic_id: None,
            mic_label: None,
            cam_id: None,
            cam_label: None,
            speaker_id: None,
            negotiate_audio: None,
            negotiate_video: None,
            google_max_bitrate: None,
            google_min_bitrate: None,
            google_start_bitrate: None,
            media_settings: None,
            preferred_codecs: Vec::new(),
            debug: None,
            debug_output: None,
            user_variables: BTreeMap::new(),
            custom_headers: Vec::new(),
            telnyx_call_control_id: None,
            telnyx_session_id: None,
            telnyx_leg_id: None,
            prefetch_ice_candidates: None,
            force_relay_candidate: None,
        }
    }
}

impl CallOptions {
    /// Audio call to a destination number
    pub fn to(destination: impl Into<String>) -> Self {
        Self {
            destination_number: Some(destination.into()),
            ..Default::default()
        }
    }
}

/// Options for answering an incoming call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_headers: Vec<CustomHeader>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_codecs: Vec<RtpCodecCapability>,
}

/// Options for hanging up
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HangupOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause_code: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sip_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sip_call_id: Option<String>,
}

/// Caller identity shown while screen sharing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenShareOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_caller_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_caller_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_number: Option<String>,
}

/// Microphone constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mic_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo_cancellation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_suppression: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_gain_control: Option<bool>,
}

/// Camera constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cam_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cam_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing_mode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn call_options_default_to_audio_only() {
        let options: CallOptions = serde_json::from_value(json!({
            "destinationNumber": "+15550100"
        }))
        .unwrap();

        assert!(options.audio);
        assert!(!options.video);
        assert_eq!(options.destination_number.as_deref(), Some("+15550100"));
    }

    #[test]
    fn call_options_keep_snake_case_codec_key() {
        let options = CallOptions {
            preferred_codecs: vec![RtpCodecCapability {
                mime_type: "audio/opus".to_string(),
                clock_rate: Some(48000),
                ..Default::default()
            }],
            ..CallOptions::to("1000")
        };

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["preferred_codecs"][0]["mimeType"], "audio/opus");
        assert_eq!(json["destinationNumber"], "1000");
        assert!(json.get("callerName").is_none());
    }

    #[test]
    fn media_settings_use_sdp_names() {
        let settings = MediaSettings {
            sdp_as_bandwidth_kbps: Some(64),
            use_sdp_as_bandwidth_kbps: Some(true),
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json, json!({ "sdpASBandwidthKbps": 64, "useSdpASBandwidthKbps": true }));
    }

    #[test]
    fn hangup_options_parse_sip_fields() {
        let options: HangupOptions = serde_json::from_value(json!({
            "cause": "USER_BUSY",
            "causeCode": 17,
            "sipCode": "486"
        }))
        .unwrap();
        assert_eq!(options.cause_code, Some(17));
        assert_eq!(options.sip_code.as_deref(), Some("486"));
    }
}
