//! Command line joystick for network testing.
//!
//! Each line typed is a list of button indices to press, e.g. `2` or `0 4`, which is published as
//! a press followed by a release. `exit` presses the default exit button.
//!
//! Usage: `sim_joy [joy_bind_endpoint]`

use comms_if::{
    eqpt::joy::{JoyButtons, JOY_TOPIC, NUM_JOY_BUTTONS},
    net::{with_topic, MonitoredSocket, SocketOptions},
};
use rustyline::{error::ReadlineError, Editor};

const PROMPT: &str = "joy $ ";

/// Button pressed by `exit`.
const EXIT_BUTTON_IDX: usize = 5;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let joy_endpoint = args.get(1).map(String::as_str).unwrap_or("tcp://*:5012");

    let ctx = zmq::Context::new();
    let socket = MonitoredSocket::new(
        &ctx,
        zmq::PUB,
        SocketOptions {
            bind: true,
            linger: 100,
            ..Default::default()
        },
        joy_endpoint,
    )?;

    println!("Simulated joystick publishing on {}", joy_endpoint);

    let mut rl = Editor::<(), rustyline::history::DefaultHistory>::new()?;

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        rl.add_history_entry(line.as_str());

        let raw = match parse_buttons(&line) {
            Ok(r) => r,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        for buttons in [JoyButtons::from_raw(&raw), JoyButtons::default()].iter() {
            let msg = with_topic(JOY_TOPIC, &serde_json::to_string(buttons)?);
            if let Err(e) = socket.send(&msg, 0) {
                println!("Failed to publish buttons: {}", e);
            }
        }

        if raw[EXIT_BUTTON_IDX] != 0 {
            break;
        }
    }

    Ok(())
}

fn parse_buttons(line: &str) -> Result<[i32; NUM_JOY_BUTTONS], String> {
    let mut raw = [0; NUM_JOY_BUTTONS];

    for tok in line.split_whitespace() {
        let idx = match tok {
            "exit" => EXIT_BUTTON_IDX,
            t => t
                .parse::<usize>()
                .map_err(|_| format!("\"{}\" is not a button index", t))?,
        };

        match raw.get_mut(idx) {
            Some(b) => *b = 1,
            None => return Err(format!("Button {} out of range", idx)),
        }
    }

    Ok(raw)
}
