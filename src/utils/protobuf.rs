use crate::models::TokenInfo;
use thiserror::Error;

/// 解码失败的分类。字段缺失不是错误，见 [`find_first`]。
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("read past end of buffer")]
    OutOfBounds,

    #[error("buffer ended inside a varint")]
    IncompleteVarint,

    #[error("unknown wire type: {0}")]
    UnknownWireType(u8),

    #[error("string field is not valid UTF-8")]
    InvalidEncoding,
}

/// 单个字段的原始值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Varint(u64),
    Bytes(&'a [u8]),
}

/// Protobuf Varint 编码
pub fn encode_varint(mut value: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    while value >= 0x80 {
        buf.push((value & 0x7F | 0x80) as u8);
        value >>= 7;
    }
    buf.push(value as u8);
    buf
}

/// 读取 Protobuf Varint，返回 (值, 编码后的偏移)。
pub fn read_varint(data: &[u8], offset: usize) -> Result<(u64, usize), DecodeError> {
    if offset >= data.len() {
        return Err(DecodeError::OutOfBounds);
    }

    let mut result = 0u64;
    let mut shift = 0u32;
    let mut pos = offset;

    loop {
        if pos >= data.len() || shift >= 64 {
            // 到缓冲区末尾仍未见终止字节，或编码超出 u64 的十字节上限
            return Err(DecodeError::IncompleteVarint);
        }
        let byte = data[pos];
        result |= ((byte & 0x7F) as u64) << shift;
        pos += 1;
        if byte & 0x80 == 0 {
            return Ok((result, pos));
        }
        shift += 7;
    }
}

/// 跳过 Protobuf 字段，不解释其内容。
pub fn skip_field(data: &[u8], offset: usize, wire_type: u8) -> Result<usize, DecodeError> {
    match wire_type {
        0 => {
            // Varint
            let (_, new_offset) = read_varint(data, offset)?;
            Ok(new_offset)
        }
        1 => {
            // 64-bit
            Ok(offset + 8)
        }
        2 => {
            // Length-delimited。声明长度可能是恶意的超大值，相加必须防溢出
            let (length, content_offset) = read_varint(data, offset)?;
            content_offset
                .checked_add(length as usize)
                .ok_or(DecodeError::OutOfBounds)
        }
        5 => {
            // 32-bit
            Ok(offset + 4)
        }
        other => Err(DecodeError::UnknownWireType(other)),
    }
}

/// 线性扫描，返回第一个 (field_num, wire_type) 都匹配的字段值。
///
/// tag 处的 varint 损坏视为扫描结束（`Ok(None)`），这样位于有效匹配之后的
/// 脏尾部数据不会推翻前面的结果；跳过非匹配字段时的错误照常上抛。
pub fn find_first<'a>(
    data: &'a [u8],
    target_field: u64,
    target_wire: u8,
) -> Result<Option<FieldValue<'a>>, DecodeError> {
    let mut offset = 0;

    while offset < data.len() {
        let Ok((tag, after_tag)) = read_varint(data, offset) else {
            break;
        };
        let wire_type = (tag & 7) as u8;
        let field_num = tag >> 3;

        if field_num == target_field && wire_type == target_wire {
            match wire_type {
                0 => {
                    let Ok((value, _)) = read_varint(data, after_tag) else {
                        break;
                    };
                    return Ok(Some(FieldValue::Varint(value)));
                }
                2 => {
                    let Ok((length, content_offset)) = read_varint(data, after_tag) else {
                        break;
                    };
                    let Some(end) = content_offset.checked_add(length as usize) else {
                        break;
                    };
                    if end > data.len() {
                        break;
                    }
                    return Ok(Some(FieldValue::Bytes(&data[content_offset..end])));
                }
                _ => {}
            }
        }

        offset = skip_field(data, after_tag, wire_type)?;
    }

    Ok(None)
}

/// 查找指定的 Length-Delimited 字段内容。
pub fn find_field<'a>(data: &'a [u8], target_field: u64) -> Result<Option<&'a [u8]>, DecodeError> {
    match find_first(data, target_field, 2)? {
        Some(FieldValue::Bytes(bytes)) => Ok(Some(bytes)),
        _ => Ok(None),
    }
}

/// 解析嵌套的 Timestamp 消息，取 field 1 (seconds, varint)。
pub fn parse_timestamp(data: &[u8]) -> Result<Option<i64>, DecodeError> {
    match find_first(data, 1, 0)? {
        Some(FieldValue::Varint(seconds)) => Ok(Some(seconds as i64)),
        _ => Ok(None),
    }
}

/// 解析 OAuthTokenInfo 消息:
///
/// ```text
/// message OAuthTokenInfo {
///     optional string access_token = 1;
///     optional string token_type = 2;
///     optional string refresh_token = 3;
///     optional Timestamp expiry = 4;
/// }
/// ```
///
/// 未知字段一律跳过；字符串字段不是合法 UTF-8 时整个解码失败。
pub fn parse_token_info(data: &[u8]) -> Result<TokenInfo, DecodeError> {
    let mut offset = 0;
    let mut info = TokenInfo::default();

    while offset < data.len() {
        let (tag, after_tag) = read_varint(data, offset)?;
        let wire_type = (tag & 7) as u8;
        let field_num = tag >> 3;

        if wire_type == 2 {
            let (length, content_offset) = read_varint(data, after_tag)?;
            let end = content_offset
                .checked_add(length as usize)
                .ok_or(DecodeError::OutOfBounds)?;
            if end > data.len() {
                return Err(DecodeError::OutOfBounds);
            }
            let value = &data[content_offset..end];
            offset = end;

            match field_num {
                1 => info.access_token = Some(decode_utf8(value)?),
                2 => info.token_type = Some(decode_utf8(value)?),
                3 => info.refresh_token = Some(decode_utf8(value)?),
                4 => info.expiry_seconds = parse_timestamp(value)?,
                _ => {}
            }
            continue;
        }

        offset = skip_field(data, after_tag, wire_type)?;
    }

    Ok(info)
}

fn decode_utf8(value: &[u8]) -> Result<String, DecodeError> {
    std::str::from_utf8(value)
        .map(str::to_string)
        .map_err(|_| DecodeError::InvalidEncoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 组装一条 length-delimited 字段: tag + 长度 + 内容。
    fn len_field(field_num: u64, value: &[u8]) -> Vec<u8> {
        let mut buf = encode_varint(field_num << 3 | 2);
        buf.extend(encode_varint(value.len() as u64));
        buf.extend_from_slice(value);
        buf
    }

    fn varint_field(field_num: u64, value: u64) -> Vec<u8> {
        let mut buf = encode_varint(field_num << 3);
        buf.extend(encode_varint(value));
        buf
    }

    #[test]
    fn test_varint_round_trip() {
        for value in [
            0u64,
            1,
            127,
            128,
            300,
            16_383,
            16_384,
            1_700_000_000,
            u64::from(u32::MAX),
            u64::MAX,
        ] {
            let encoded = encode_varint(value);
            assert_eq!(read_varint(&encoded, 0), Ok((value, encoded.len())));
        }
    }

    #[test]
    fn test_varint_round_trip_mid_buffer() {
        let mut buf = vec![0xFFu8; 3];
        buf.extend(encode_varint(300));
        assert_eq!(read_varint(&buf, 3), Ok((300, buf.len())));
    }

    #[test]
    fn test_varint_out_of_bounds() {
        assert_eq!(read_varint(&[], 0), Err(DecodeError::OutOfBounds));
        assert_eq!(read_varint(&[0x01], 1), Err(DecodeError::OutOfBounds));
        assert_eq!(read_varint(&[0x01], 5), Err(DecodeError::OutOfBounds));
    }

    #[test]
    fn test_varint_incomplete() {
        // 末字节仍带续位
        assert_eq!(read_varint(&[0x80], 0), Err(DecodeError::IncompleteVarint));
        assert_eq!(
            read_varint(&[0xFF, 0xFF, 0x80], 0),
            Err(DecodeError::IncompleteVarint)
        );
    }

    #[test]
    fn test_varint_overlong() {
        let buf = [0x80u8; 11];
        assert_eq!(read_varint(&buf, 0), Err(DecodeError::IncompleteVarint));
    }

    #[test]
    fn test_skip_field_advances_exactly() {
        // wire 0: varint 本体
        let buf = encode_varint(16_384);
        assert_eq!(skip_field(&buf, 0, 0), Ok(buf.len()));

        // wire 1 / wire 5: 固定宽度
        let buf = [0u8; 16];
        assert_eq!(skip_field(&buf, 2, 1), Ok(10));
        assert_eq!(skip_field(&buf, 2, 5), Ok(6));

        // wire 2: 长度前缀 + 内容，与内容字节无关
        let cases: [&[u8]; 3] = [b"", b"abc", &[0xFF; 200]];
        for content in cases {
            let mut buf = encode_varint(content.len() as u64);
            let prefix_len = buf.len();
            buf.extend_from_slice(content);
            assert_eq!(skip_field(&buf, 0, 2), Ok(prefix_len + content.len()));
        }
    }

    #[test]
    fn test_skip_field_unknown_wire_type() {
        assert_eq!(
            skip_field(&[0x00], 0, 3),
            Err(DecodeError::UnknownWireType(3))
        );
        assert_eq!(
            skip_field(&[0x00], 0, 7),
            Err(DecodeError::UnknownWireType(7))
        );
    }

    #[test]
    fn test_find_field_first_match_wins() {
        let mut buf = len_field(6, b"first");
        buf.extend(len_field(6, b"second"));
        assert_eq!(find_field(&buf, 6), Ok(Some(&b"first"[..])));
    }

    #[test]
    fn test_find_field_not_found_is_not_an_error() {
        assert_eq!(find_field(&[], 6), Ok(None));

        let mut buf = len_field(1, b"a");
        buf.extend(varint_field(2, 42));
        buf.extend(len_field(3, b"c"));
        assert_eq!(find_field(&buf, 6), Ok(None));
    }

    #[test]
    fn test_find_field_skips_mixed_wire_types() {
        let mut buf = varint_field(1, 7);
        buf.extend(encode_varint(2 << 3 | 1)); // field 2, 64-bit
        buf.extend_from_slice(&[0u8; 8]);
        buf.extend(encode_varint(3 << 3 | 5)); // field 3, 32-bit
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend(len_field(6, b"payload"));
        assert_eq!(find_field(&buf, 6), Ok(Some(&b"payload"[..])));
    }

    #[test]
    fn test_find_field_malformed_trailing_bytes_ignored() {
        // 匹配之后的脏数据不影响结果
        let mut buf = len_field(6, b"ok");
        buf.push(0x80);
        assert_eq!(find_field(&buf, 6), Ok(Some(&b"ok"[..])));

        // 匹配之前的 tag 损坏则提前结束扫描，按未找到处理
        let mut buf = len_field(1, b"a");
        buf.push(0x80);
        assert_eq!(find_field(&buf, 6), Ok(None));
    }

    #[test]
    fn test_oversized_length_does_not_overflow() {
        // 声明长度为 u64::MAX，偏移相加不得回绕
        let mut matching = encode_varint(6 << 3 | 2);
        matching.extend(encode_varint(u64::MAX));
        assert_eq!(find_field(&matching, 6), Ok(None));

        // 非匹配字段在跳过时遇到同样的长度，按解码失败上抛
        let mut other = encode_varint(1 << 3 | 2);
        other.extend(encode_varint(u64::MAX));
        assert_eq!(find_field(&other, 6), Err(DecodeError::OutOfBounds));
        assert_eq!(skip_field(&other, 1, 2), Err(DecodeError::OutOfBounds));
    }

    #[test]
    fn test_parse_token_info_oversized_length() {
        let mut buf = encode_varint(1 << 3 | 2);
        buf.extend(encode_varint(u64::MAX));
        assert_eq!(parse_token_info(&buf), Err(DecodeError::OutOfBounds));
    }

    #[test]
    fn test_find_field_truncated_length_is_not_found() {
        // 声明长度超过剩余字节
        let mut buf = encode_varint(6 << 3 | 2);
        buf.extend(encode_varint(100));
        buf.extend_from_slice(b"short");
        assert_eq!(find_field(&buf, 6), Ok(None));
    }

    #[test]
    fn test_parse_timestamp() {
        let buf = varint_field(1, 1_700_000_000);
        assert_eq!(parse_timestamp(&buf), Ok(Some(1_700_000_000)));

        // 其他字段在前，照常跳过
        let mut buf = len_field(2, b"zone");
        buf.extend(varint_field(1, 42));
        assert_eq!(parse_timestamp(&buf), Ok(Some(42)));

        // 没有 field 1 (varint) 不是错误
        assert_eq!(parse_timestamp(&len_field(1, b"x")), Ok(None));
        assert_eq!(parse_timestamp(&[]), Ok(None));
    }

    #[test]
    fn test_parse_token_info() {
        let mut buf = len_field(1, b"AT1");
        buf.extend(len_field(3, b"RT1"));
        buf.extend(len_field(4, &varint_field(1, 1_700_000_000)));

        let info = parse_token_info(&buf).unwrap();
        assert_eq!(info.access_token.as_deref(), Some("AT1"));
        assert_eq!(info.token_type, None);
        assert_eq!(info.refresh_token.as_deref(), Some("RT1"));
        assert_eq!(info.expiry_seconds, Some(1_700_000_000));
    }

    #[test]
    fn test_parse_token_info_skips_unknown_fields() {
        let mut buf = len_field(9, b"future");
        buf.extend(varint_field(5, 1));
        buf.extend(len_field(3, b"RT2"));

        let info = parse_token_info(&buf).unwrap();
        assert_eq!(info.refresh_token.as_deref(), Some("RT2"));
        assert_eq!(info.access_token, None);
    }

    #[test]
    fn test_parse_token_info_invalid_utf8() {
        let buf = len_field(1, &[0xFF, 0xFE]);
        assert_eq!(parse_token_info(&buf), Err(DecodeError::InvalidEncoding));
    }

    #[test]
    fn test_parse_token_info_empty_record() {
        let info = parse_token_info(&[]).unwrap();
        assert_eq!(info.refresh_token, None);
        assert_eq!(info.expiry_seconds, None);
    }

    #[test]
    fn test_field6_then_token_info() {
        use base64::{engine::general_purpose, Engine as _};

        let inner = len_field(3, b"refresh-xyz");
        let mut top = len_field(2, b"noise");
        top.extend(len_field(6, &inner));
        let encoded = general_purpose::STANDARD.encode(&top);

        let raw = general_purpose::STANDARD.decode(encoded).unwrap();
        let oauth_field = find_field(&raw, 6).unwrap().unwrap();
        let info = parse_token_info(oauth_field).unwrap();
        assert_eq!(info.refresh_token.as_deref(), Some("refresh-xyz"));
    }
}
