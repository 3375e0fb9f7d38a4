//! PCM → WAV wrapping for speech/ambience output.
//!
//! The speech endpoint returns headerless 16-bit little-endian PCM at 24 kHz mono.
//! Players need a RIFF header in front of it.

/// Sample rate of synthesized speech.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;
/// Channel count of synthesized speech.
pub const SPEECH_CHANNELS: u16 = 1;
/// Bits per sample of synthesized speech.
pub const SPEECH_BITS_PER_SAMPLE: u16 = 16;

const HEADER_LEN: usize = 44;

/// Wrap raw PCM in a WAV container using the speech defaults.
pub fn pcm_to_wav(pcm: &[u8]) -> Vec<u8> {
    pcm_to_wav_with(pcm, SPEECH_SAMPLE_RATE, SPEECH_CHANNELS, SPEECH_BITS_PER_SAMPLE)
}

/// Wrap raw PCM in a WAV container with an explicit format.
pub fn pcm_to_wav_with(pcm: &[u8], sample_rate: u32, channels: u16, bits_per_sample: u16) -> Vec<u8> {
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = pcm.len() as u32;

    let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt subchunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data subchunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out.extend_from_slice(pcm);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(buf: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }

    fn u16_at(buf: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([buf[at], buf[at + 1]])
    }

    #[test]
    fn test_header_layout() {
        let pcm = vec![1u8, 2, 3, 4, 5, 6];
        let wav = pcm_to_wav(&pcm);

        assert_eq!(wav.len(), 44 + pcm.len());
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 36 + 6);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u16_at(&wav, 20), 1);
        assert_eq!(u16_at(&wav, 22), 1);
        assert_eq!(u32_at(&wav, 24), 24_000);
        assert_eq!(u32_at(&wav, 28), 48_000);
        assert_eq!(u16_at(&wav, 32), 2);
        assert_eq!(u16_at(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), 6);
        assert_eq!(&wav[44..], &pcm[..]);
    }

    #[test]
    fn test_empty_pcm() {
        let wav = pcm_to_wav(&[]);
        assert_eq!(wav.len(), 44);
        assert_eq!(u32_at(&wav, 40), 0);
    }

    #[test]
    fn test_custom_format() {
        let wav = pcm_to_wav_with(&[0; 8], 44_100, 2, 16);
        assert_eq!(u32_at(&wav, 24), 44_100);
        assert_eq!(u32_at(&wav, 28), 44_100 * 4);
        assert_eq!(u16_at(&wav, 32), 4);
    }
}
