//! Fixed advisor instructions and the opening greeting.

use crate::advisory::AdvisoryState;

/// System instructions placed first in every assembled context.
pub const ADVISOR_INSTRUCTIONS: &str = concat!(
    "You are a friendly travel insurance advisor. Only answer questions related to travel insurance. ",
    "Use the provided policy documents, destination list, and weather forecast to guide your responses. ",
    "Prompt the user for:\n",
    "- Destination, age, and trip duration\n",
    "- Whether they plan to rent a vehicle\n",
    "- If they want to check past natural disaster history\n\n",
    "Based on their answers, suggest relevant insurance policies from Scootsurance or TravelEasy. ",
    "Once they choose a policy, recommend useful add-ons like hospital income, rental car coverage, or COVID-19 benefits. ",
    "If the user declines add-ons, gently follow up with:\n",
    "'Are you sure? These extras can really help if things don’t go as planned.'\n",
    "If they still say no, respect their choice and proceed with confirming their selected coverage.\n\n",
    "Keep the tone warm, conversational, and helpful throughout.",
);

const GREETING_INTRO: &str = concat!(
    "Hey there! 😊 Planning a trip soon?\n\n",
    "I’m here to help you sort out your travel insurance. Just tell me:\n",
    "- Where you're headed\n",
    "- Your age\n",
    "- How long you'll be away\n",
    "- Whether you plan to rent a vehicle\n",
    "- And if you'd like to check past natural disaster history for your destination",
);

/// Opening message for an empty session. Mentions the weather narrative
/// when one is already known.
pub fn greeting(advisory: &AdvisoryState) -> String {
    match &advisory.weather {
        Some(weather) => format!(
            "{GREETING_INTRO}\n\nI'll also factor in the latest weather forecast to help you choose the best coverage. Here's what I found:\n\n{weather}"
        ),
        None => GREETING_INTRO.to_string(),
    }
}
