/// Declares a client-side instruction builder for one program instruction.
/// The build script parses these declarations to generate the shank
/// instruction enum, so keep one `account: kind, desc: "..."` per line.
///
/// Account kinds map to account metas:
/// - `signer => writable` signs and is written
/// - `signer` signs, read-only
/// - `writable` written, not a signer
/// - `readonly` neither
#[macro_export]
macro_rules! define_instruction {
    (@flags signer => writable) => { (true, true) };
    (@flags signer) => { (true, false) };
    (@flags writable) => { (false, true) };
    (@flags readonly) => { (false, false) };

    (
        discriminant: $disc:literal,
        $name:ident,
        accounts: {
            $(
                $account:ident: $kind:tt $(=> $modifier:tt)*, desc: $desc:literal
            ),* $(,)?
        },
        data: {
            $(
                $field:ident: $field_type:ty
            ),* $(,)?
        } $(,)?
    ) => {
        ::paste::paste! {
            /// Accounts in the order the program expects them.
            #[derive(Clone, Copy, Debug, PartialEq, Eq)]
            pub struct [<$name Accounts>] {
                $(pub $account: ::solana_sdk::pubkey::Pubkey,)*
            }

            impl [<$name Accounts>] {
                pub fn to_account_metas(&self) -> ::std::vec::Vec<::solana_sdk::instruction::AccountMeta> {
                    ::std::vec![
                        $({
                            let (is_signer, is_writable) =
                                $crate::define_instruction!(@flags $kind $(=> $modifier)*);
                            ::solana_sdk::instruction::AccountMeta {
                                pubkey: self.$account,
                                is_signer,
                                is_writable,
                            }
                        },)*
                    ]
                }
            }

            #[repr(C)]
            #[derive(Clone, Copy, Debug, PartialEq, Eq, ::bytemuck::Pod, ::bytemuck::Zeroable)]
            pub struct [<$name Data>] {
                $(pub $field: $field_type,)*
            }

            impl [<$name Data>] {
                pub const LEN: usize = ::core::mem::size_of::<Self>();

                /// Splits the discriminator off a raw payload and reads the fields.
                pub fn unpack(payload: &[u8]) -> ::core::option::Option<Self> {
                    match payload.split_first() {
                        Some((&$disc, rest)) => ::bytemuck::try_from_bytes::<Self>(rest).ok().copied(),
                        _ => None,
                    }
                }
            }

            pub struct $name;

            impl $name {
                pub const DISCRIMINATOR: u8 = $disc;
                pub const NAME: &'static str = stringify!($name);
                pub const ACCOUNTS: &'static [(&'static str, &'static str)] = &[
                    $((stringify!($account), $desc),)*
                ];

                pub fn instruction(
                    program_id: &::solana_sdk::pubkey::Pubkey,
                    accounts: &[<$name Accounts>],
                    data: &[<$name Data>],
                ) -> ::solana_sdk::instruction::Instruction {
                    let mut payload = ::std::vec::Vec::with_capacity(1 + [<$name Data>]::LEN);
                    payload.push(Self::DISCRIMINATOR);
                    payload.extend_from_slice(::bytemuck::bytes_of(data));

                    ::solana_sdk::instruction::Instruction {
                        program_id: *program_id,
                        accounts: accounts.to_account_metas(),
                        data: payload,
                    }
                }
            }
        }
    };
}

/// Define account layouts with zero-copy load methods
#[macro_export]
macro_rules! define_state {
    (
        $(
            $(#[$meta:meta])*
            pub struct $name:ident {
                $(pub $field:ident: $field_type:ty),* $(,)?
            }
        )*
    ) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            #[derive(Clone, Copy, Debug, PartialEq, Eq, ::bytemuck::Pod, ::bytemuck::Zeroable)]
            pub struct $name {
                $(pub $field: $field_type,)*
            }

            impl $name {
                pub const LEN: usize = ::core::mem::size_of::<Self>();

                /// Reads the layout from account bytes of exactly `LEN` bytes.
                pub fn load(data: &[u8]) -> ::core::result::Result<&Self, $crate::error::DecodeError> {
                    ::bytemuck::try_from_bytes::<Self>(data).map_err(|_| {
                        $crate::error::DecodeError::Malformed {
                            layout: stringify!($name),
                            reason: format!("expected {} bytes, found {}", Self::LEN, data.len()),
                        }
                    })
                }
            }
        )*
    };
}

/// Define the program's custom error codes with automatic InvalidDiscriminator
///
/// The generated enum derives `ShankType` so it appears in the IDL, and maps
/// `InstructionError::Custom` codes back to names on the client.
#[macro_export]
macro_rules! define_program_errors {
    (
        pub enum $error_name:ident {
            $(
                $(#[doc = $doc:literal])*
                $variant:ident = $code:literal
            ),* $(,)?
        }
    ) => {
        /// Program error codes
        #[derive(Clone, Copy, Debug, PartialEq, Eq, ::shank::ShankType)]
        #[repr(u32)]
        pub enum $error_name {
            /// Invalid instruction discriminator
            InvalidDiscriminator = 6001,
            $(
                $(#[doc = $doc])*
                $variant = $code,
            )*
        }

        impl $error_name {
            pub fn from_code(code: u32) -> ::core::option::Option<Self> {
                match code {
                    6001 => Some(Self::InvalidDiscriminator),
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub fn code(self) -> u32 {
                self as u32
            }
        }

        impl ::core::fmt::Display for $error_name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match self {
                    Self::InvalidDiscriminator => write!(f, "Invalid instruction discriminator"),
                    $(
                        Self::$variant => write!(f, "{}", stringify!($variant)),
                    )*
                }
            }
        }
    };
}
