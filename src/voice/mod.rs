//! Voice processing module
//!
//! Handles recording, WAV re-encoding, speech synthesis and playback.

mod capture;
mod decode;
mod encoder;
mod playback;
mod recording;
mod tts;
pub mod wav;

pub use capture::{MicrophoneRecorder, RECORDING_MEDIA_TYPE, samples_to_float_wav};
pub use decode::{AudioDecoder, DecodedAudio, SymphoniaDecoder, decode};
pub use encoder::{
    DEFAULT_MAX_DURATION, EncoderLimits, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE, WaveformEncoder,
};
pub use playback::{AudioSink, FileSink, PcmAudio, SpeakerSink, decode_speech, play_blocking};
pub use recording::{CaptureSession, DEFAULT_CHUNK_BYTES, Recording, media_type_for_path};
pub use tts::{AudioFormat, SpeechAudio, SpeechClient, Synthesizer};
pub use wav::{HEADER_LEN, interleave, quantize_and_frame};
