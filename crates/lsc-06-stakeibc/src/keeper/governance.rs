//! Admin-gated control plane: zone registration, validator set edits,
//! halts, bounds and interchain-account handshakes.

use super::host_zone::{all_host_zones, get_host_zone, must_get_host_zone, set_host_zone};
use super::StakeIbcKeeper;
use crate::domain::{
    ControlMsg, HostZone, HostZoneConfig, IcaAccount, IcaAccountType, RedemptionBounds, Validator, ValidatorConfig,
};
use crate::error::{StakeIbcError, StakeIbcResult};
use bech32::Hrp;
use lsc_ledger_store::BlockContext;
use lsc_records::keeper::unbonding::create_epoch_unbonding_record;
use shared_types::math::bps;
use shared_types::{st_denom, Dec, Int, StakeEvent};
use tracing::{info, warn};

fn invalid(reason: impl Into<String>) -> StakeIbcError {
    StakeIbcError::InvalidControlMessage(reason.into())
}

impl StakeIbcKeeper {
    /// Applies a control message atomically.
    ///
    /// # Returns
    /// - `Err(Unauthorized)`: `signer` is not an admin
    /// - `Err(InvalidControlMessage)`: The message failed validation
    pub fn handle_control(&self, ctx: &mut BlockContext<'_>, signer: &str, msg: ControlMsg) -> StakeIbcResult<()> {
        if !self.params.is_admin(signer) {
            warn!(signer, msg = msg.name(), "Control message from non-admin");
            return Err(StakeIbcError::Unauthorized(signer.to_string()));
        }
        let name = msg.name();
        ctx.branch(|ctx| self.apply_control(ctx, msg))?;
        info!(signer, msg = name, "Control message applied");
        Ok(())
    }

    fn apply_control(&self, ctx: &mut BlockContext<'_>, msg: ControlMsg) -> StakeIbcResult<()> {
        match msg {
            ControlMsg::RegisterHostZone(config) => self.register_host_zone(ctx, config),
            ControlMsg::AddValidator { chain_id, validator } => self.add_validator(ctx, &chain_id, validator),
            ControlMsg::RemoveValidator { chain_id, address } => self.remove_validator(ctx, &chain_id, &address),
            ControlMsg::ChangeValidatorWeight {
                chain_id,
                address,
                weight,
            } => {
                let mut zone = must_get_host_zone(ctx.store(), &chain_id)?;
                zone.validator_mut(&address)
                    .ok_or_else(|| invalid(format!("{address} is not in the {chain_id} set")))?
                    .weight = weight;
                set_host_zone(ctx.store_mut(), &zone)?;
                ctx.emit(StakeEvent::ValidatorWeightChanged {
                    chain_id,
                    validator: address,
                    weight,
                });
                Ok(())
            }
            ControlMsg::ToggleHalt { chain_id } => {
                let mut zone = must_get_host_zone(ctx.store(), &chain_id)?;
                zone.halted = !zone.halted;
                set_host_zone(ctx.store_mut(), &zone)?;
                ctx.emit(if zone.halted {
                    StakeEvent::HostZoneHalted {
                        chain_id,
                        reason: "toggled by admin".to_string(),
                    }
                } else {
                    StakeEvent::HostZoneResumed { chain_id }
                });
                Ok(())
            }
            ControlMsg::ResumeHostZone { chain_id } => {
                let mut zone = must_get_host_zone(ctx.store(), &chain_id)?;
                zone.halted = false;
                zone.redemption_rate_frozen = false;
                set_host_zone(ctx.store_mut(), &zone)?;
                ctx.emit(StakeEvent::HostZoneResumed { chain_id });
                Ok(())
            }
            ControlMsg::UpdateRedemptionBounds { chain_id, bounds } => {
                bounds.validate().map_err(invalid)?;
                let mut zone = must_get_host_zone(ctx.store(), &chain_id)?;
                zone.set_bounds(&bounds);
                set_host_zone(ctx.store_mut(), &zone)?;
                ctx.emit(StakeEvent::RedemptionBoundsUpdated { chain_id });
                Ok(())
            }
            ControlMsg::SetLsmEnabled { chain_id, enabled } => {
                let mut zone = must_get_host_zone(ctx.store(), &chain_id)?;
                zone.lsm_liquid_stake_enabled = enabled;
                set_host_zone(ctx.store_mut(), &zone)
            }
            ControlMsg::RegisterIcaAccount {
                chain_id,
                account_type,
                address,
                channel_id,
            } => self.register_ica_account(ctx, &chain_id, account_type, &address, &channel_id),
        }
    }

    fn parse_validator(&self, prefix: &str, config: ValidatorConfig) -> StakeIbcResult<Validator> {
        let address = self
            .accounts
            .parse_bech32(&config.address, &format!("{prefix}valoper"))
            .map_err(|err| invalid(err.to_string()))?;
        Ok(Validator::new(address, config.name, config.weight))
    }

    fn register_host_zone(&self, ctx: &mut BlockContext<'_>, config: HostZoneConfig) -> StakeIbcResult<()> {
        if get_host_zone(ctx.store(), &config.chain_id)?.is_some() {
            return Err(invalid(format!("host zone {} already registered", config.chain_id)));
        }
        if config.chain_id.is_empty() || config.host_denom.is_empty() || config.ibc_denom.is_empty() {
            return Err(invalid("chain id and denoms must be set"));
        }
        Hrp::parse(&config.bech32_prefix)
            .map_err(|err| invalid(format!("bech32 prefix {}: {err}", config.bech32_prefix)))?;
        if !config.transfer_channel_id.starts_with("channel-") {
            return Err(invalid(format!("bad transfer channel {}", config.transfer_channel_id)));
        }
        if !config.connection_id.starts_with("connection-") {
            return Err(invalid(format!("bad connection {}", config.connection_id)));
        }
        if config.unbonding_period_days == 0 || config.max_messages_per_ica_tx == 0 {
            return Err(invalid("unbonding period and message cap must be positive"));
        }
        for existing in all_host_zones(ctx.store())? {
            if existing.host_denom == config.host_denom {
                return Err(invalid(format!("{} already hosts {}", existing.chain_id, config.host_denom)));
            }
            if existing.transfer_channel_id == config.transfer_channel_id {
                return Err(invalid(format!(
                    "{} already uses {}",
                    existing.chain_id, config.transfer_channel_id
                )));
            }
        }
        let bounds = match config.bounds {
            Some(bounds) => bounds,
            None => RedemptionBounds::outer_only(
                bps(self.params.safety_min_redemption_rate_threshold_bps)?,
                bps(self.params.safety_max_redemption_rate_threshold_bps)?,
            ),
        };
        bounds.validate().map_err(invalid)?;

        let mut validators: Vec<Validator> = Vec::with_capacity(config.validators.len());
        for validator in config.validators {
            let validator = self.parse_validator(&config.bech32_prefix, validator)?;
            if validators.iter().any(|v| v.address == validator.address) {
                return Err(invalid(format!("duplicate validator {}", validator.address)));
            }
            validators.push(validator);
        }

        let deposit_address = self
            .accounts
            .create_module_account(ctx.store_mut(), &format!("{}.deposit", config.chain_id))?;
        let redemption_module_address = self
            .accounts
            .create_module_account(ctx.store_mut(), &format!("{}.redemption", config.chain_id))?;

        let mut zone = HostZone {
            derivative_denom: st_denom(&config.host_denom),
            chain_id: config.chain_id,
            bech32_prefix: config.bech32_prefix,
            connection_id: config.connection_id,
            transfer_channel_id: config.transfer_channel_id,
            host_denom: config.host_denom,
            ibc_denom: config.ibc_denom,
            deposit_address,
            redemption_module_address,
            delegation_ica: None,
            withdrawal_ica: None,
            fee_ica: None,
            redemption_ica: None,
            validators,
            total_delegations: Int::zero(),
            redemption_rate: Dec::one(),
            last_redemption_rate: Dec::one(),
            min_redemption_rate: Dec::zero(),
            max_redemption_rate: Dec::zero(),
            min_inner_redemption_rate: Dec::zero(),
            max_inner_redemption_rate: Dec::zero(),
            redemption_rate_frozen: false,
            reward_balance: Int::zero(),
            reward_sweep_in_progress: false,
            reward_sweep_generation: 0,
            unbonding_period_days: config.unbonding_period_days,
            max_messages_per_ica_tx: config.max_messages_per_ica_tx,
            halted: false,
            lsm_liquid_stake_enabled: config.lsm_liquid_stake_enabled,
        };
        zone.set_bounds(&bounds);
        set_host_zone(ctx.store_mut(), &zone)?;

        if let Some(epoch) = lsc_epochs::get_epoch_info(ctx.store(), lsc_epochs::STRIDE_EPOCH)? {
            if epoch.epoch_counting_started {
                create_epoch_unbonding_record(
                    ctx.store_mut(),
                    epoch.current_epoch,
                    &[(zone.chain_id.clone(), zone.host_denom.clone())],
                )?;
            }
        }

        info!(
            chain_id = %zone.chain_id,
            host_denom = %zone.host_denom,
            validators = zone.validators.len(),
            "Host zone registered"
        );
        ctx.emit(StakeEvent::HostZoneRegistered {
            chain_id: zone.chain_id,
        });
        Ok(())
    }

    fn add_validator(&self, ctx: &mut BlockContext<'_>, chain_id: &str, config: ValidatorConfig) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        let validator = self.parse_validator(&zone.bech32_prefix, config)?;
        if zone.validator(&validator.address).is_some() {
            return Err(invalid(format!("{} is already in the {chain_id} set", validator.address)));
        }
        let (address, weight) = (validator.address.clone(), validator.weight);
        zone.validators.push(validator);
        set_host_zone(ctx.store_mut(), &zone)?;
        ctx.emit(StakeEvent::ValidatorAdded {
            chain_id: chain_id.to_string(),
            validator: address,
            weight,
        });
        Ok(())
    }

    fn remove_validator(&self, ctx: &mut BlockContext<'_>, chain_id: &str, address: &str) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        let validator = zone
            .validator(address)
            .ok_or_else(|| invalid(format!("{address} is not in the {chain_id} set")))?;
        if !validator.delegation.is_zero() || validator.delegation_changes_in_progress > 0 {
            return Err(invalid(format!(
                "{address} still holds {} with {} changes in flight",
                validator.delegation, validator.delegation_changes_in_progress
            )));
        }
        zone.validators.retain(|v| v.address != address);
        set_host_zone(ctx.store_mut(), &zone)?;
        ctx.emit(StakeEvent::ValidatorRemoved {
            chain_id: chain_id.to_string(),
            validator: address.to_string(),
        });
        Ok(())
    }

    fn register_ica_account(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        account_type: IcaAccountType,
        address: &str,
        channel_id: &str,
    ) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        let address = self
            .accounts
            .parse_bech32(address, &zone.bech32_prefix)
            .map_err(|err| invalid(err.to_string()))?;
        if !channel_id.starts_with("channel-") {
            return Err(invalid(format!("bad ICA channel {channel_id}")));
        }
        zone.set_ica(
            account_type,
            IcaAccount {
                address,
                port_id: account_type.port_id(chain_id),
                channel_id: channel_id.to_string(),
            },
        );
        set_host_zone(ctx.store_mut(), &zone)?;
        info!(chain_id, account = account_type.as_str(), channel_id, "Interchain account registered");
        Ok(())
    }
}
