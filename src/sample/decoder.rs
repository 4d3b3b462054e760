use super::error::DecodeError;
use super::types::{EnvSample, RawSample};

const FLOAT_WIDTH: usize = 4;

pub const AZ_ALT_PAYLOAD_LEN: usize = 2 * FLOAT_WIDTH;

/// Decode an azimuth/altitude notification: two little-endian `f32` values,
/// azimuth first, both in degrees.
pub fn decode(payload: &[u8]) -> Result<RawSample, DecodeError> {
    let [azimuth_deg, altitude_deg] = decode_floats::<2>(payload)?;
    Ok(RawSample {
        azimuth_deg,
        altitude_deg,
    })
}

/// Decode an environment reading: temperature, humidity and dewpoint as three
/// little-endian `f32` values.
pub fn decode_environment(payload: &[u8]) -> Result<EnvSample, DecodeError> {
    let [temperature_f, humidity_pct, dewpoint_f] = decode_floats::<3>(payload)?;
    Ok(EnvSample {
        temperature_f,
        humidity_pct,
        dewpoint_f,
    })
}

fn decode_floats<const N: usize>(payload: &[u8]) -> Result<[f32; N], DecodeError> {
    let expected = N * FLOAT_WIDTH;
    if payload.len() != expected {
        return Err(DecodeError::Length {
            expected,
            actual: payload.len(),
        });
    }

    let mut values = [0.0f32; N];
    for (index, (value, chunk)) in values
        .iter_mut()
        .zip(payload.chunks_exact(FLOAT_WIDTH))
        .enumerate()
    {
        let decoded = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if !decoded.is_finite() {
            return Err(DecodeError::NonFinite { index });
        }
        *value = decoded;
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn encode(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_decode_known_payload() {
        let sample = decode(&hex!("00 00 34 43 00 00 34 42")).unwrap();
        assert_eq!(sample.azimuth_deg, 180.0);
        assert_eq!(sample.altitude_deg, 45.0);
    }

    #[test]
    fn test_decode_round_trip_is_bit_exact() {
        let values = [
            0.0f32,
            -0.0,
            1.0,
            -1.0,
            180.4028,
            36.8355,
            359.999,
            f32::MIN_POSITIVE,
            f32::MIN_POSITIVE / 2.0,
            f32::MAX,
            f32::MIN,
            f32::EPSILON,
        ];
        for a in values {
            for b in values {
                let sample = decode(&encode(&[a, b])).unwrap();
                assert_eq!(sample.azimuth_deg.to_bits(), a.to_bits());
                assert_eq!(sample.altitude_deg.to_bits(), b.to_bits());
            }
        }
    }

    #[test]
    fn test_decode_rejects_malformed_length() {
        for len in [0usize, 4, 7, 9, 12] {
            let payload = vec![0u8; len];
            assert_eq!(
                decode(&payload),
                Err(DecodeError::Length {
                    expected: AZ_ALT_PAYLOAD_LEN,
                    actual: len
                })
            );
        }
    }

    #[test]
    fn test_decode_rejects_non_finite() {
        assert_eq!(
            decode(&encode(&[10.0, f32::NAN])),
            Err(DecodeError::NonFinite { index: 1 })
        );
        assert_eq!(
            decode(&encode(&[f32::INFINITY, 10.0])),
            Err(DecodeError::NonFinite { index: 0 })
        );
    }

    #[test]
    fn test_decode_environment() {
        let env = decode_environment(&hex!("00 00 89 42 00 00 20 42 00 00 2e 42")).unwrap();
        assert_eq!(env.temperature_f, 68.5);
        assert_eq!(env.humidity_pct, 40.0);
        assert_eq!(env.dewpoint_f, 43.5);
        assert_eq!(
            env.to_string(),
            "temp: 68.5F  humidity: 40.0%  dewpoint: 43.5F"
        );
    }

    #[test]
    fn test_decode_environment_rejects_malformed_length() {
        for len in [0usize, 8, 11, 13] {
            assert!(matches!(
                decode_environment(&vec![0u8; len]),
                Err(DecodeError::Length { expected: 12, .. })
            ));
        }
    }
}
