use std::path::Path;
use std::time::Duration;

use delve_core::{
    CombatState, Disengage, DungeonInstance, EncounterSignal, Position, load_instance_config,
};

use crate::context::CliContext;

fn print_signals(signals: &[EncounterSignal]) {
    for signal in signals {
        match signal {
            EncounterSignal::Engaged { encounter } => {
                println!("** {encounter} engaged **");
            }
            EncounterSignal::Disengaged { encounter, outcome } => match outcome {
                Disengage::Victory => println!("** {encounter} defeated **"),
                Disengage::Evaded => println!("** {encounter} resets **"),
            },
            EncounterSignal::StateChanged {
                encounter,
                old,
                new,
            } => {
                println!("   {encounter}: {old} -> {new}");
            }
            EncounterSignal::EventFired {
                encounter,
                event,
                name,
            } => {
                println!("   {encounter}: event {event} ({name})");
            }
            EncounterSignal::DoorToggled { door, open } => {
                let word = if *open { "opens" } else { "closes" };
                println!("   door {} {word}", door.0);
            }
            EncounterSignal::InstanceComplete => {
                println!("** instance complete **");
            }
        }
    }
}

pub fn load(path: &str, ctx: &mut CliContext) {
    let config = match load_instance_config(Path::new(path)) {
        Ok(config) => config,
        Err(e) => {
            println!("Failed to load config: {e}");
            return;
        }
    };
    let instance = match DungeonInstance::new(&config) {
        Ok(instance) => instance,
        Err(e) => {
            println!("Failed to build instance: {e}");
            return;
        }
    };

    println!(
        "Loaded {} (map {}): {} encounters, {} doors",
        instance.info().name,
        instance.info().map_id,
        instance.controllers().len(),
        instance.store().door_bindings().len()
    );
    ctx.install(instance);
}

pub fn party(count: u32, ctx: &mut CliContext) {
    for i in 0..count {
        let position = Position {
            x: i as f32 * 2.0,
            ..Position::default()
        };
        let id = ctx.host.spawn_player(position);
        ctx.players.push(id);
    }
}

pub fn engage(encounter: &str, ctx: &mut CliContext) {
    let Some(inst) = ctx.instance.as_mut() else {
        println!("No instance loaded");
        return;
    };
    if ctx.host.player_count() == 0 {
        println!("No party; use `party --count <n>` first");
        return;
    }

    let boss = match ctx.bosses.get(encounter) {
        Some(&boss) => boss,
        None => {
            let Some(controller) = inst.controller(encounter) else {
                println!("Unknown encounter '{encounter}'");
                return;
            };
            let boss = ctx.host.spawn_boss(&controller.script().name);
            ctx.bosses.insert(encounter.to_string(), boss);
            boss
        }
    };

    print_signals(&inst.engage(encounter, boss));
}

pub fn tick(ms: u64, count: u32, ctx: &mut CliContext) {
    let Some(inst) = ctx.instance.as_mut() else {
        println!("No instance loaded");
        return;
    };
    let elapsed = Duration::from_millis(ms);
    for _ in 0..count {
        print_signals(&inst.update(elapsed, &mut ctx.host));
    }
}

pub fn kill(encounter: &str, ctx: &mut CliContext) {
    let Some(inst) = ctx.instance.as_mut() else {
        println!("No instance loaded");
        return;
    };
    if let Some(&boss) = ctx.bosses.get(encounter) {
        ctx.host.set_health(boss, 0.0);
    }
    print_signals(&inst.notify_boss_death(encounter, &mut ctx.host));
}

pub fn wipe(ctx: &mut CliContext) {
    ctx.host.kill_players();
}

pub fn revive(ctx: &mut CliContext) {
    ctx.host.revive_players();
}

pub fn reset(encounter: &str, ctx: &mut CliContext) {
    let Some(inst) = ctx.instance.as_mut() else {
        println!("No instance loaded");
        return;
    };
    print_signals(&inst.reset_encounter(encounter, &mut ctx.host));
}

pub fn hp(encounter: &str, percent: f32, ctx: &mut CliContext) {
    let Some(&boss) = ctx.bosses.get(encounter) else {
        println!("'{encounter}' has no boss; engage it first");
        return;
    };
    ctx.host.set_health(boss, percent / 100.0);
    println!("{encounter} boss at {percent:.0}%");
}

pub fn state(ctx: &CliContext) {
    let Some(inst) = ctx.instance.as_ref() else {
        println!("No instance loaded");
        return;
    };

    println!("{} (map {})", inst.info().name, inst.info().map_id);
    println!("{:<20} {:<14} Combat", "Encounter", "Progress");
    println!("{}", "-".repeat(48));
    for controller in inst.controllers() {
        let id = &controller.script().encounter_id;
        let combat = match controller.combat_state() {
            CombatState::Idle => "idle",
            CombatState::Engaged => "engaged",
            CombatState::Victory => "victory",
        };
        println!("{:<20} {:<14} {}", id, inst.state_of(id).to_string(), combat);
        if controller.combat_state() == CombatState::Engaged {
            println!("    in combat for {:.1?}", controller.combat_time());
        }
    }
}

pub fn doors(ctx: &CliContext) {
    let Some(inst) = ctx.instance.as_ref() else {
        println!("No instance loaded");
        return;
    };
    if ctx.doors.is_empty() {
        println!("No doors registered");
        return;
    }

    let store = inst.store();
    for (door, open) in &ctx.doors {
        let binding = store.door_bindings().iter().find(|b| b.door == *door);
        let detail = binding
            .map(|b| format!("{:?} {} ", b.kind, b.boundary).to_lowercase())
            .unwrap_or_default();
        let state = match open.get() {
            Some(true) => "open",
            Some(false) => "closed",
            None => "untouched",
        };
        println!("door {:<8} {detail}- {state}", door.0);
    }
}

pub fn save(ctx: &CliContext) {
    let Some(inst) = ctx.instance.as_ref() else {
        println!("No instance loaded");
        return;
    };
    println!("{}", inst.save());
}

pub fn restore(data: &str, ctx: &mut CliContext) {
    let Some(inst) = ctx.instance.as_mut() else {
        println!("No instance loaded");
        return;
    };
    match inst.load_progress(data) {
        Ok(()) => {
            println!("Progress restored");
            state(ctx);
        }
        Err(e) => println!("Restore failed ({e}); instance left at defaults"),
    }
}

pub fn exit() {
    use std::io::Write;
    write!(std::io::stdout(), "quitting...").expect("error exiting");
    std::io::stdout().flush().expect("error flushing stdout");
}
