//! Sparse overrides and their overlay onto complete records.

use crate::core::record::{ConfigRecord, NotificationLevel};

/// Types with a zero value meaning "not specified".
pub trait Sparse {
    /// Whether this value is the zero value of its type.
    fn is_unset(&self) -> bool;
}

impl Sparse for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl Sparse for u16 {
    fn is_unset(&self) -> bool {
        *self == 0
    }
}

impl Sparse for u32 {
    fn is_unset(&self) -> bool {
        *self == 0
    }
}

impl Sparse for bool {
    fn is_unset(&self) -> bool {
        !*self
    }
}

impl<T> Sparse for Vec<T> {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl Sparse for NotificationLevel {
    fn is_unset(&self) -> bool {
        *self == NotificationLevel::Unset
    }
}

/// Declares a sparse override struct whose fields mirror identically named
/// fields of [`ConfigRecord`], and generates the overlay for it.
///
/// A field added here is merged automatically; a field without a counterpart
/// of the same name and type on the record fails to compile.
macro_rules! sparse_override {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident: $ty:ty,
            )*
        }
    ) => {
        $(#[$meta])*
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $name {
            /// Names of all fields this override can set.
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];

            /// Copy every specified field onto the identically named field of
            /// `base`. Lists are cloned into fresh storage.
            pub fn apply_to(&self, base: &mut ConfigRecord) {
                $(
                    if !Sparse::is_unset(&self.$field) {
                        base.$field = Clone::clone(&self.$field);
                    }
                )*
            }

            /// Names of the fields that carry a value.
            pub fn specified(&self) -> Vec<&'static str> {
                let mut names = Vec::new();
                $(
                    if !Sparse::is_unset(&self.$field) {
                        names.push(stringify!($field));
                    }
                )*
                names
            }

            /// Whether no field carries a value.
            pub fn is_empty(&self) -> bool {
                true $(&& Sparse::is_unset(&self.$field))*
            }
        }
    };
}

sparse_override! {
    /// Configuration values derived from a volume's labels.
    ///
    /// Every field left at its zero value means "not specified, keep the
    /// base value".
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct LabelOverride {
        /// `schedule`
        pub backup_cron_expression: String,
        /// `target`
        pub backup_archive: String,
        /// `rotation`
        pub backup_retention_days: u32,
        /// `gpg-passphrase`
        pub gpg_passphrase: String,
        /// `gpg-public-key-ring`
        pub gpg_public_key_ring: String,
        /// `age-passphrase`
        pub age_passphrase: String,
        /// `age-public-keys`
        pub age_public_keys: Vec<String>,
        /// `stop-during-backup`
        pub backup_stop_during_backup_label: String,
        /// `notification-urls`
        pub notification_urls: Vec<String>,
        /// `notification-level`
        pub notification_level: NotificationLevel,
        /// `email-recipient`
        pub email_notification_recipient: String,
        /// `email-sender`
        pub email_notification_sender: String,
        /// `smtp-host`
        pub email_smtp_host: String,
        /// `smtp-port`
        pub email_smtp_port: u16,
        /// `smtp-username`
        pub email_smtp_username: String,
        /// `smtp-password`
        pub email_smtp_password: String,
    }
}

/// Overlay `overlay` onto `base`, returning the merged record.
pub fn merge(mut base: ConfigRecord, overlay: &LabelOverride) -> ConfigRecord {
    overlay.apply_to(&mut base);
    base
}
