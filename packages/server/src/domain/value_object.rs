//! Value Objects
//!
//! 文字列をそのまま使わず、生成時に検証済みであることを型で保証します。

use std::fmt;

use serde::Serialize;

use super::error::ValueObjectError;

/// ClientId の最大長
const CLIENT_ID_MAX_LEN: usize = 64;
/// RoomName の最大長
const ROOM_NAME_MAX_LEN: usize = 128;
/// MessageId の最大長
const MESSAGE_ID_MAX_LEN: usize = 128;

fn validate(
    value: &str,
    field: &'static str,
    max: usize,
) -> Result<(), ValueObjectError> {
    if value.trim().is_empty() {
        return Err(ValueObjectError::Empty(field));
    }
    if value.chars().count() > max {
        return Err(ValueObjectError::TooLong { field, max });
    }
    Ok(())
}

macro_rules! string_value_object {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// 検証して生成
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                validate(&value, $field, $max)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValueObjectError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_value_object!(
    /// 接続中ユーザーの識別子（接続の間は不変）
    ClientId,
    "client_id",
    CLIENT_ID_MAX_LEN
);

string_value_object!(
    /// ルーム名（ルームテーブルのキー）
    RoomName,
    "room",
    ROOM_NAME_MAX_LEN
);

string_value_object!(
    /// 既読通知で参照されるメッセージ ID
    MessageId,
    "message_id",
    MESSAGE_ID_MAX_LEN
);

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
