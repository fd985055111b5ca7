use super::host_zone::{ensure_accepting_user_actions, host_zone_by_host_denom};
use super::StakeIbcKeeper;
use crate::domain::MsgLiquidStake;
use crate::error::{StakeIbcError, StakeIbcResult};
use lsc_ledger_store::BlockContext;
use lsc_records::keeper::deposit::{append_deposit_record, open_transfer_record, set_deposit_record};
use lsc_records::{DepositRecord, DepositRecordSource, DepositRecordStatus};
use shared_types::math::div_floor;
use shared_types::{Coin, Int, StakeEvent};
use tracing::info;

impl StakeIbcKeeper {
    /// Escrows wrapped native tokens, mints stTokens at the stored rate and
    /// adds the amount to the zone's open TRANSFER_QUEUE record.
    ///
    /// Returns the minted stToken amount.
    pub fn liquid_stake(&self, ctx: &mut BlockContext<'_>, msg: &MsgLiquidStake) -> StakeIbcResult<Int> {
        ctx.branch(|ctx| self.apply_liquid_stake(ctx, msg))
    }

    fn apply_liquid_stake(&self, ctx: &mut BlockContext<'_>, msg: &MsgLiquidStake) -> StakeIbcResult<Int> {
        if msg.amount.is_zero() {
            return Err(StakeIbcError::ZeroAmount);
        }
        let zone = host_zone_by_host_denom(ctx.store(), &msg.host_denom)?;
        ensure_accepting_user_actions(&zone)?;

        let available = self.bank.balance(ctx.store(), &msg.creator, &zone.ibc_denom)?;
        if available < msg.amount {
            return Err(StakeIbcError::InsufficientBalance {
                address: msg.creator.clone(),
                denom: zone.ibc_denom.clone(),
                required: msg.amount,
                available,
            });
        }

        let st_amount = div_floor(msg.amount, zone.redemption_rate)?;
        if st_amount.is_zero() {
            return Err(StakeIbcError::InsufficientLiquidStake {
                amount: msg.amount,
                rate: zone.redemption_rate,
            });
        }

        self.bank.send(
            ctx.store_mut(),
            &msg.creator,
            &zone.deposit_address,
            &Coin::new(msg.amount, zone.ibc_denom.clone()),
        )?;
        self.bank.mint(
            ctx.store_mut(),
            &msg.creator,
            &Coin::new(st_amount, zone.derivative_denom.clone()),
        )?;

        let epoch = self.current_stride_epoch(ctx.store())?;
        match open_transfer_record(ctx.store(), &zone.chain_id, epoch)? {
            Some(mut record) => {
                record.amount = record.amount.checked_add(msg.amount)?;
                set_deposit_record(ctx.store_mut(), &record)?;
            }
            None => {
                append_deposit_record(
                    ctx.store_mut(),
                    DepositRecord::new(
                        zone.chain_id.clone(),
                        zone.host_denom.clone(),
                        msg.amount,
                        DepositRecordStatus::TransferQueue,
                        DepositRecordSource::StrideDeposit,
                        epoch,
                    ),
                )?;
            }
        }

        info!(
            chain_id = %zone.chain_id,
            staker = %msg.creator,
            amount = %msg.amount,
            st_amount = %st_amount,
            "Liquid stake"
        );
        ctx.emit(StakeEvent::LiquidStake {
            chain_id: zone.chain_id,
            staker: msg.creator.clone(),
            native_amount: msg.amount,
            st_amount,
        });
        Ok(st_amount)
    }
}
