use serde::{Deserialize, Serialize};
use tracing::info;

use super::log::{ActionId, ActionType, DamageEntry, NewAction};
use super::CombatEngine;
use crate::combatant::{CombatantId, DamageOutcome, DamageType};
use crate::error::{CombatError, Result};
use crate::notation::DiceExpression;
use crate::roller::RollResult;
use crate::AdMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackResult {
    pub action_id: ActionId,
    pub attacker_id: CombatantId,
    pub target_id: CombatantId,
    pub hit: bool,
    /// A hit whose kept d20 was a natural 20.
    pub critical_hit: bool,
    /// The kept d20 was a natural 1.
    pub critical_fail: bool,
    pub attack_roll: RollResult,
    /// One roll on a normal hit, two independent rolls on a critical, none on a miss.
    pub damage_rolls: Vec<RollResult>,
    pub damage_bonus: i32,
    pub total_damage: i32,
    pub damage: Option<DamageOutcome>,
    pub target_hp: i32,
    pub target_max_hp: i32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellCast {
    pub action_id: ActionId,
    pub caster_id: CombatantId,
    pub spell_name: String,
    pub level: u32,
    pub target_ids: Vec<CombatantId>,
    pub description: String,
}

impl CombatEngine {
    /// Resolve one weapon attack.
    ///
    /// The attack hits when `1d20 + attack_bonus` reaches the target's AC. A
    /// hit rolls the attacker's damage dice once, or twice independently on a
    /// natural 20, and adds the damage bonus once. The attacker's action is
    /// spent whether or not the attack lands.
    pub fn make_attack(
        &mut self,
        attacker_id: CombatantId,
        target_id: CombatantId,
        advantage: bool,
        disadvantage: bool,
    ) -> Result<AttackResult> {
        let attacker = self.get(attacker_id)?;
        let target = self.get(target_id)?;
        if !attacker.has_action {
            return Err(CombatError::NoActionAvailable {
                combatant: attacker.name.clone(),
                resource: ActionType::Action,
            });
        }
        let attacker_name = attacker.name.clone();
        let attack_bonus = attacker.attack_bonus;
        let damage_dice = attacker.damage_dice.clone();
        let damage_bonus = attacker.damage_bonus;
        let damage_type = attacker.damage_type;
        let target_name = target.name.clone();
        let armor_class = target.armor_class;
        let hp_before = target.current_hp();

        let mode = AdMode::from_flags(advantage, disadvantage);
        let attack_roll = self
            .roller
            .roll_expression(&DiceExpression::d20(attack_bonus, mode), Some("Attack Roll"));
        let hit = attack_roll.total >= armor_class;
        let critical_hit = hit && attack_roll.critical_hit;

        self.get_mut(attacker_id)?.spend(ActionType::Action)?;

        let mut damage_rolls = Vec::new();
        let mut total_damage = 0;
        let mut damage = None;
        if hit {
            damage_rolls.push(self.roller.roll(&damage_dice, Some("Damage")));
            if critical_hit {
                damage_rolls.push(self.roller.roll(&damage_dice, Some("Critical Damage")));
            }
            total_damage = damage_rolls
                .iter()
                .fold(damage_bonus, |acc, r| acc.saturating_add(r.total));
            damage = Some(self.get_mut(target_id)?.take_damage(total_damage, damage_type));
        }

        let target = self.get(target_id)?;
        let (target_hp, target_max_hp) = (target.current_hp(), target.max_hp());

        let mut lines = vec![describe_attack(&attacker_name, &target_name, &attack_roll, hit, critical_hit, armor_class)];
        if let Some(outcome) = &damage {
            lines.push(describe_damage(
                &attacker_name,
                &damage_dice,
                damage_bonus,
                critical_hit,
                outcome.damage_taken,
                damage_type,
            ));
            lines.push(format!("[HP][{}] {} → {}", target_name, hp_before, outcome.new_hp));
            if outcome.dropped {
                let state = if outcome.dead { "Dead" } else { "Unconscious" };
                lines.push(format!("[STATE][{}] drops to 0 HP → {}", target_name, state));
            }
        }
        let description = lines.join(" | ");
        info!("{}", description);

        let mut effects = vec![if hit { "hit" } else { "miss" }.to_string()];
        if critical_hit {
            effects.push("critical".to_string());
        }
        if attack_roll.critical_fail {
            effects.push("fumble".to_string());
        }
        match attack_roll.mode {
            AdMode::Advantage => effects.push("advantage".to_string()),
            AdMode::Disadvantage => effects.push("disadvantage".to_string()),
            AdMode::Normal => {}
        }
        if let Some(outcome) = damage.filter(|o| o.dropped) {
            effects.push(if outcome.dead { "target_dead" } else { "target_unconscious" }.to_string());
        }

        let mut roll_results = vec![attack_roll.clone()];
        roll_results.extend(damage_rolls.iter().cloned());
        let entry = NewAction {
            combatant_id: attacker_id,
            action_type: ActionType::Action,
            name: "Attack".to_string(),
            description: description.clone(),
            target_ids: vec![target_id],
            roll_results,
            damage_results: damage
                .map(|o| DamageEntry {
                    target_id,
                    amount: o.damage_taken,
                    damage_type: o.damage_type,
                    critical: critical_hit,
                })
                .into_iter()
                .collect(),
            effects,
        };
        let action_id = self.log.record(entry, self.round_number).id;

        Ok(AttackResult {
            action_id,
            attacker_id,
            target_id,
            hit,
            critical_hit,
            critical_fail: attack_roll.critical_fail,
            attack_roll,
            damage_rolls,
            damage_bonus,
            total_damage,
            damage,
            target_hp,
            target_max_hp,
            description,
        })
    }

    /// Record a spell. Only the action is spent and logged; slots, saves and
    /// effects belong to the caller's rules layer.
    pub fn cast_spell(
        &mut self,
        caster_id: CombatantId,
        spell_name: &str,
        targets: &[CombatantId],
        level: u32,
    ) -> Result<SpellCast> {
        let target_names = self.names_of(targets)?;
        let caster = self.get_mut(caster_id)?;
        caster.spend(ActionType::Action)?;
        let caster_name = caster.name.clone();

        let mut description = format!("[SPELL][{}] casts {} (level {})", caster_name, spell_name, level);
        if !target_names.is_empty() {
            description.push_str(&format!(" at {}", target_names.join(", ")));
        }
        info!("{}", description);

        let mut entry = NewAction::new(caster_id, ActionType::Action, spell_name);
        entry.description = description.clone();
        entry.target_ids = targets.to_vec();
        entry.effects = vec!["spell".to_string(), format!("spell_level:{level}")];
        let action_id = self.log.record(entry, self.round_number).id;

        Ok(SpellCast {
            action_id,
            caster_id,
            spell_name: spell_name.to_string(),
            level,
            target_ids: targets.to_vec(),
            description,
        })
    }

    /// Log an arbitrary action and spend the slot `kind` names. Free actions
    /// and movement spend nothing here; use [`CombatEngine::move_combatant`]
    /// to spend feet.
    pub fn take_action(
        &mut self,
        actor_id: CombatantId,
        kind: ActionType,
        name: &str,
        description: &str,
        targets: &[CombatantId],
    ) -> Result<ActionId> {
        self.names_of(targets)?;
        self.get_mut(actor_id)?.spend(kind)?;
        let mut entry = NewAction::new(actor_id, kind, name);
        entry.description = description.to_string();
        entry.target_ids = targets.to_vec();
        Ok(self.log.record(entry, self.round_number).id)
    }

    /// Spend `feet` of movement. Returns the movement left.
    pub fn move_combatant(&mut self, id: CombatantId, feet: u32) -> Result<u32> {
        let mover = self.get_mut(id)?;
        let remaining = mover.spend_movement(feet)?;
        let description = format!("[MOVE][{}] moves {} ft ({} ft left)", mover.name, feet, remaining);

        let mut entry = NewAction::new(id, ActionType::Movement, "Move");
        entry.description = description;
        entry.effects = vec![format!("feet:{feet}")];
        self.log.record(entry, self.round_number);
        Ok(remaining)
    }

    fn names_of(&self, ids: &[CombatantId]) -> Result<Vec<String>> {
        ids.iter()
            .map(|id| self.get(*id).map(|c| c.name.clone()))
            .collect()
    }
}

fn format_d20_sequence(raw: &[u32], kept: u32) -> String {
    match raw {
        [first, second] => format!("d20={} vs d20={} (keep={})", first, second, kept),
        _ => format!("d20={} (keep={})", kept, kept),
    }
}

fn format_modifier(modifier: i32) -> String {
    if modifier >= 0 {
        format!("+{}", modifier)
    } else {
        format!("-{}", modifier.unsigned_abs())
    }
}

fn describe_attack(
    attacker: &str,
    target: &str,
    roll: &RollResult,
    hit: bool,
    critical: bool,
    armor_class: i32,
) -> String {
    let kept = roll.kept_rolls.first().copied().unwrap_or_default();
    let rolls = format_d20_sequence(&roll.individual_rolls, kept);
    let outcome = if critical {
        "CRIT!"
    } else if hit {
        "HIT"
    } else if roll.critical_fail {
        "MISS (NAT1)"
    } else if roll.critical_hit {
        "MISS (NAT20)"
    } else {
        "MISS"
    };
    let mark = if hit { "✔" } else { "✖" };
    format!(
        "[ATTACK][{} → {}] {} → {} to-hit={} vs AC={} {}",
        attacker, target, rolls, outcome, roll.total, armor_class, mark
    )
}

fn describe_damage(
    attacker: &str,
    dice: &str,
    bonus: i32,
    critical: bool,
    total: i32,
    damage_type: DamageType,
) -> String {
    let (prefix, dice_expr) = if critical {
        ("crit: ", format!("2×({})", dice))
    } else {
        ("", dice.to_string())
    };
    format!(
        "[DMG][{}] {}rolled {} {} = {} [{}]",
        attacker,
        prefix,
        dice_expr,
        format_modifier(bonus),
        total,
        damage_type
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn d20_sequences_render_like_the_log() {
        assert_eq!(format_d20_sequence(&[14], 14), "d20=14 (keep=14)");
        assert_eq!(format_d20_sequence(&[7, 20], 20), "d20=7 vs d20=20 (keep=20)");
        assert_eq!(format_modifier(-2), "-2");
        assert_eq!(format_modifier(0), "+0");
        assert_eq!(format_modifier(i32::MIN), "-2147483648");
    }
}
