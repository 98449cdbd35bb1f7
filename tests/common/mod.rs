//! A tiny simulator writer for integration tests.
//!
//! Lays out a region with three rotating buffers and a fixed set of variables, then
//! publishes rows the way the simulator does: write the next buffer, bump its tick,
//! signal.

#![allow(dead_code)]

use paddock::MemorySource;
use std::sync::Arc;

pub const REGION_LEN: usize = 64 * 1024;
pub const VAR_TABLE_OFFSET: usize = 144;
pub const SESSION_OFFSET: usize = 4096;
pub const SESSION_CAPACITY: usize = 8192;
pub const BUFFER_START: usize = 16 * 1024;
pub const BUF_LEN: usize = 64;
pub const NUM_BUF: usize = 3;

/// (name, type code, row offset, count, count_as_time, unit)
pub const VARIABLES: &[(&str, i32, i32, i32, bool, &str)] = &[
    ("SessionTime", 5, 0, 1, true, "s"),
    ("Speed", 4, 8, 1, false, "m/s"),
    ("Gear", 2, 12, 1, false, ""),
    ("SessionFlags", 3, 16, 1, false, "irsdk_Flags"),
    ("OnPitRoad", 1, 20, 1, false, ""),
    ("LapLastLapTime", 4, 24, 1, true, "s"),
    ("CarIdxLapDistPct", 4, 28, 3, false, "%"),
];

/// One published row
#[derive(Debug, Clone, Copy)]
pub struct Row {
    pub session_time: f64,
    pub speed: f32,
    pub gear: i32,
    pub flags: u32,
    pub on_pit_road: bool,
    pub last_lap: f32,
    pub lap_pct: [f32; 3],
}

impl Row {
    pub fn at(session_time: f64) -> Self {
        Self {
            session_time,
            speed: 42.0,
            gear: 3,
            flags: 0x8000_0000,
            on_pit_road: false,
            last_lap: 83.456,
            lap_pct: [0.25, 0.5, -1.0],
        }
    }

    fn encode(&self) -> [u8; BUF_LEN] {
        let mut row = [0u8; BUF_LEN];
        row[0..8].copy_from_slice(&self.session_time.to_le_bytes());
        row[8..12].copy_from_slice(&self.speed.to_le_bytes());
        row[12..16].copy_from_slice(&self.gear.to_le_bytes());
        row[16..20].copy_from_slice(&self.flags.to_le_bytes());
        row[20] = u8::from(self.on_pit_road);
        row[24..28].copy_from_slice(&self.last_lap.to_le_bytes());
        for (i, pct) in self.lap_pct.iter().enumerate() {
            row[28 + i * 4..32 + i * 4].copy_from_slice(&pct.to_le_bytes());
        }
        row
    }
}

pub struct SimWriter {
    pub source: Arc<MemorySource>,
    tick: i32,
    session_update: i32,
}

impl SimWriter {
    /// Connected region with descriptors and session text, but no rows yet.
    pub fn new(session: &str) -> Self {
        let source = Arc::new(MemorySource::zeroed(REGION_LEN));
        let mut writer = Self { source, tick: 0, session_update: 0 };

        writer.put_i32(0, 2); // ver
        writer.put_i32(4, 1); // status
        writer.put_i32(8, 60); // tickRate
        writer.put_i32(24, VARIABLES.len() as i32);
        writer.put_i32(28, VAR_TABLE_OFFSET as i32);
        writer.put_i32(32, NUM_BUF as i32);
        writer.put_i32(36, BUF_LEN as i32);
        for index in 0..NUM_BUF {
            writer.put_i32(52 + index * 16, (BUFFER_START + index * BUF_LEN) as i32);
        }

        for (index, (name, code, offset, count, as_time, unit)) in VARIABLES.iter().enumerate() {
            let at = VAR_TABLE_OFFSET + index * 144;
            let mut record = [0u8; 144];
            record[0..4].copy_from_slice(&code.to_le_bytes());
            record[4..8].copy_from_slice(&offset.to_le_bytes());
            record[8..12].copy_from_slice(&count.to_le_bytes());
            record[12] = u8::from(*as_time);
            record[16..16 + name.len()].copy_from_slice(name.as_bytes());
            record[112..112 + unit.len()].copy_from_slice(unit.as_bytes());
            writer.source.write_at(at, &record).unwrap();
        }

        writer.set_session(session);
        writer
    }

    fn put_i32(&mut self, at: usize, value: i32) {
        self.source.write_at(at, &value.to_le_bytes()).unwrap();
    }

    /// Replace the session text (stored as Windows-1252) and bump the update counter.
    pub fn set_session(&mut self, text: &str) {
        let (encoded, _, _) = encoding_rs::WINDOWS_1252.encode(text);
        let mut bytes = vec![0u8; SESSION_CAPACITY];
        bytes[..encoded.len()].copy_from_slice(&encoded);
        self.source.write_at(SESSION_OFFSET, &bytes).unwrap();

        self.session_update += 1;
        self.put_i32(12, self.session_update);
        self.put_i32(16, SESSION_CAPACITY as i32);
        self.put_i32(20, SESSION_OFFSET as i32);
    }

    /// Write `row` into the next buffer, advance the tick and signal readers.
    pub fn publish(&mut self, row: Row) -> i32 {
        self.tick += 1;
        let index = self.tick as usize % NUM_BUF;
        self.source.write_at(BUFFER_START + index * BUF_LEN, &row.encode()).unwrap();
        self.put_i32(48 + index * 16, self.tick);
        self.source.signal();
        self.tick
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.put_i32(4, i32::from(connected));
        self.source.signal();
    }

    /// Simulator restart: ticks start over from zero.
    pub fn restart(&mut self) {
        self.tick = 0;
        for index in 0..NUM_BUF {
            self.put_i32(48 + index * 16, 0);
        }
    }
}

pub const SESSION: &str = "\
WeekendInfo:
 TrackName: spa 2024 up
 TrackID: 163
 TrackDisplayName: Circuit de Spa-Francorchamps
 NumCarTypes: 1
SessionInfo:
 Sessions:
 - SessionNum: 0
   SessionType: Practice
   SessionLaps: unlimited
 - SessionNum: 1
   SessionType: Race
   SessionLaps: 20
DriverInfo:
 DriverCarIdx: 0
 Drivers:
 - CarIdx: 0
   UserName: Ren\u{e9} Arnoux
   CarNumber: \"28\"
 - CarIdx: 1
   UserName: Pace Car
   CarNumber: \"0\"
";
