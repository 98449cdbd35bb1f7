//! Outbound broadcast commands.
//!
//! The simulator accepts remote-control commands (camera, replay, chat, pit service,
//! telemetry recording, force feedback, video capture) as a registered window message
//! named [`BROADCAST_MSG_NAME`]. This module builds the fixed-shape command and its
//! packed message words; delivering them is left to a [`BroadcastSink`].

use serde::{Deserialize, Serialize};

use crate::Result;

/// Registered window message name the simulator listens on
pub const BROADCAST_MSG_NAME: &str = "IRSDK_BROADCASTMSG";

/// Pack two 16-bit words into a 32-bit message parameter (low word first).
pub const fn make_long(low: u16, high: u16) -> u32 {
    (low as u32) | ((high as u32) << 16)
}

/// Command codes, carried in the low word of `wParam`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum BroadcastKind {
    /// car position, group, camera
    CamSwitchPos = 0,
    /// driver number, group, camera
    CamSwitchNum = 1,
    /// camera state bits
    CamSetState = 2,
    /// speed, slow motion
    ReplaySetPlaySpeed = 3,
    /// position mode, frame number
    ReplaySetPlayPosition = 4,
    /// search mode
    ReplaySearch = 5,
    /// state mode
    ReplaySetState = 6,
    /// reload mode, car index
    ReloadTextures = 7,
    /// chat mode, sub command
    ChatCommand = 8,
    /// pit mode, parameter
    PitCommand = 9,
    /// telemetry recording mode
    TelemCommand = 10,
    /// force feedback mode, value
    FfbCommand = 11,
    /// session number, session time in milliseconds
    ReplaySearchSessionTime = 12,
    /// video capture mode
    VideoCapture = 13,
}

/// Camera targets accepted by [`BroadcastCommand::cam_switch_pos`] and
/// [`BroadcastCommand::cam_switch_num`] in place of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum CameraFocus {
    Incident = -3,
    Leader = -2,
    Exiting = -1,
    Driver = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ChatCommandMode {
    /// Launch chat macro 1-15
    Macro = 0,
    BeginChat = 1,
    Reply = 2,
    Cancel = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum PitCommandMode {
    Clear = 0,
    /// Clean the windshield with one tear-off
    Windshield = 1,
    /// Add fuel in liters, 0 keeps the current amount
    Fuel = 2,
    /// Change a tire, optionally at a pressure in KPa
    LeftFront = 3,
    RightFront = 4,
    LeftRear = 5,
    RightRear = 6,
    ClearTires = 7,
    FastRepair = 8,
    ClearWindshield = 9,
    ClearFastRepair = 10,
    ClearFuel = 11,
    TireCompound = 12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum TelemCommandMode {
    Stop = 0,
    Start = 1,
    /// Write the current file and start a new one
    Restart = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ReplayStateMode {
    EraseTape = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ReloadTexturesMode {
    All = 0,
    CarIdx = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ReplaySearchMode {
    ToStart = 0,
    ToEnd = 1,
    PrevSession = 2,
    NextSession = 3,
    PrevLap = 4,
    NextLap = 5,
    PrevFrame = 6,
    NextFrame = 7,
    PrevIncident = 8,
    NextIncident = 9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ReplayPositionMode {
    Begin = 0,
    Current = 1,
    End = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum FfbCommandMode {
    /// Maximum steering force in Nm
    MaxForce = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum VideoCaptureMode {
    TriggerScreenShot = 0,
    StartVideoCapture = 1,
    EndVideoCapture = 2,
    ToggleVideoCapture = 3,
    ShowVideoTimer = 4,
    HideVideoTimer = 5,
}

/// Parameters after the first word.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BroadcastParams {
    /// Two 16-bit words packed into `lParam`
    Int { var2: i32, var3: i32 },
    /// A float sent as `value * 65536` across all of `lParam`
    Float(f32),
}

/// A fully formed broadcast command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BroadcastCommand {
    pub kind: BroadcastKind,
    pub var1: i32,
    pub params: BroadcastParams,
}

impl BroadcastCommand {
    pub fn new(kind: BroadcastKind, var1: i32, var2: i32, var3: i32) -> Self {
        Self { kind, var1, params: BroadcastParams::Int { var2, var3 } }
    }

    pub fn with_float(kind: BroadcastKind, var1: i32, value: f32) -> Self {
        Self { kind, var1, params: BroadcastParams::Float(value) }
    }

    /// Packed `wParam`: command code and first parameter.
    pub fn wparam(&self) -> u32 {
        make_long(self.kind as u16, self.var1 as u16)
    }

    /// Packed `lParam`.
    pub fn lparam(&self) -> u32 {
        match self.params {
            BroadcastParams::Int { var2, var3 } => make_long(var2 as u16, var3 as u16),
            BroadcastParams::Float(value) => (value * 65536.0) as i32 as u32,
        }
    }

    /// Focus the camera on the car at race position `position`.
    pub fn cam_switch_pos(position: i32, group: i32, camera: i32) -> Self {
        Self::new(BroadcastKind::CamSwitchPos, position, group, camera)
    }

    /// Focus the camera on car number `car_number`.
    pub fn cam_switch_num(car_number: i32, group: i32, camera: i32) -> Self {
        Self::new(BroadcastKind::CamSwitchNum, car_number, group, camera)
    }

    /// Focus the camera on a special target instead of a car.
    pub fn cam_focus(focus: CameraFocus, group: i32, camera: i32) -> Self {
        Self::new(BroadcastKind::CamSwitchPos, focus as i32, group, camera)
    }

    pub fn cam_set_state(state_bits: u32) -> Self {
        Self::new(BroadcastKind::CamSetState, state_bits as i32, 0, 0)
    }

    pub fn replay_set_play_speed(speed: i32, slow_motion: bool) -> Self {
        Self::new(BroadcastKind::ReplaySetPlaySpeed, speed, i32::from(slow_motion), 0)
    }

    /// Frame number is split across the two remaining words.
    pub fn replay_set_play_position(mode: ReplayPositionMode, frame: i32) -> Self {
        Self::new(
            BroadcastKind::ReplaySetPlayPosition,
            mode as i32,
            frame & 0xFFFF,
            (frame >> 16) & 0xFFFF,
        )
    }

    pub fn replay_search(mode: ReplaySearchMode) -> Self {
        Self::new(BroadcastKind::ReplaySearch, mode as i32, 0, 0)
    }

    pub fn replay_set_state(mode: ReplayStateMode) -> Self {
        Self::new(BroadcastKind::ReplaySetState, mode as i32, 0, 0)
    }

    pub fn reload_textures(mode: ReloadTexturesMode, car_idx: i32) -> Self {
        Self::new(BroadcastKind::ReloadTextures, mode as i32, car_idx, 0)
    }

    pub fn chat(mode: ChatCommandMode, sub_command: i32) -> Self {
        Self::new(BroadcastKind::ChatCommand, mode as i32, sub_command, 0)
    }

    pub fn pit(mode: PitCommandMode, parameter: i32) -> Self {
        Self::new(BroadcastKind::PitCommand, mode as i32, parameter, 0)
    }

    pub fn telemetry(mode: TelemCommandMode) -> Self {
        Self::new(BroadcastKind::TelemCommand, mode as i32, 0, 0)
    }

    pub fn ffb_max_force(newton_meters: f32) -> Self {
        Self::with_float(BroadcastKind::FfbCommand, FfbCommandMode::MaxForce as i32, newton_meters)
    }

    /// Session time is split across the two remaining words.
    pub fn replay_search_session_time(session_num: i32, session_time_ms: i32) -> Self {
        Self::new(
            BroadcastKind::ReplaySearchSessionTime,
            session_num,
            session_time_ms & 0xFFFF,
            (session_time_ms >> 16) & 0xFFFF,
        )
    }

    pub fn video_capture(mode: VideoCaptureMode) -> Self {
        Self::new(BroadcastKind::VideoCapture, mode as i32, 0, 0)
    }
}

/// Delivers commands to the simulator.
pub trait BroadcastSink {
    /// Send `command` on the broadcast message named `target`.
    fn send(&self, target: &str, command: &BroadcastCommand) -> Result<()>;

    /// Send on [`BROADCAST_MSG_NAME`].
    fn broadcast(&self, command: &BroadcastCommand) -> Result<()> {
        self.send(BROADCAST_MSG_NAME, command)
    }
}
