pub mod codec;
pub mod parcel;
pub mod policy;
pub mod record;
pub mod snapshot;
pub mod status;

pub use codec::{decode_canonical, decode_parcel, encode_canonical, encode_parcel, CodecError};
pub use parcel::{ParcelError, ParcelReader, ParcelWriter};
pub use policy::{CreatedBy, LocalAction, NameCollisionPolicy, TransferPolicy};
pub use record::{MirroredFile, OwningAccount, RecordError, UploadRecord};
pub use snapshot::{
    snapshot_shared, sort_for_display, DisplaySnapshot, InMemoryUploadActivity, UploadActivity,
};
pub use status::{parse_or_default, Decoded, UnknownVariant, UploadResult, UploadStatus};
