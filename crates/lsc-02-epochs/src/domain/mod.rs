mod epoch_info;

pub use epoch_info::{
    EpochInfo, EpochTick, DAY_EPOCH, HOUR_EPOCH, MINT_EPOCH, STRIDE_EPOCH,
};
