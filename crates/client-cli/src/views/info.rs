//! Static pages: welcome, support FAQ, setup guide.

use shared::Plan;

use super::pricing::{format_price, lowest_priced};

pub struct Faq {
    pub question: &'static str,
    pub answer: &'static str,
}

pub struct SetupSection {
    pub title: &'static str,
    pub lines: &'static [&'static str],
}

pub const WELCOME_TITLE: &str = "The JustPurple Movie Experience";

pub const WELCOME_TAGLINE: &str = "Stream unlimited movies and TV shows on your private, secure media server. \
Request content, watch anywhere, and enjoy the ultimate entertainment experience.";

pub const WELCOME_FEATURES: &[(&str, &str)] = &[
    (
        "Private & Secure",
        "Your personal media server with military-grade encryption. Complete privacy with no data tracking or third-party access.",
    ),
    (
        "Request Movies & TV",
        "Can't find what you want? Simply request any movie or TV show and we'll add it to your library within 24 hours.",
    ),
    (
        "Watch Anywhere",
        "Access your content from any device, anywhere in the world. Seamless streaming on phones, tablets, computers, and smart TVs.",
    ),
    (
        "Multi-Device Support",
        "Native apps for iOS, Android, Apple TV, Roku, and more. Your entertainment follows you everywhere.",
    ),
    (
        "4K HDR Streaming",
        "Crystal clear quality with support for 4K HDR, Dolby Vision, and Atmos audio for the ultimate viewing experience.",
    ),
    (
        "Family Sharing",
        "Create multiple user profiles with parental controls and personalized recommendations for each family member.",
    ),
];

/// "Starting at $9.99/month" for the cheapest plan, if the catalog has any
pub fn starting_price(plans: &[Plan]) -> Option<String> {
    lowest_priced(plans).map(|p| format!("Starting at {}/month", format_price(p.price, &p.currency)))
}

pub const SUPPORT_FAQ: &[Faq] = &[
    Faq {
        question: "How do I request movies or TV shows?",
        answer: "Once you have an active subscription, you can request content through your Emby server interface. \
Simply search for the title you want, and if it's not available, click the request button. \
Most requests are fulfilled within 24 hours.",
    },
    Faq {
        question: "What devices are supported?",
        answer: "Emby Galaxy works on virtually any device including iOS, Android, Apple TV, Roku, Fire TV, Smart TVs, \
web browsers, and more. You can stream on up to 5 devices simultaneously depending on your plan.",
    },
    Faq {
        question: "How do I access my Emby server?",
        answer: "After your subscription is activated, you'll receive your server details and login credentials via email. \
You can then download the Emby app on your preferred device and connect using the provided server address.",
    },
    Faq {
        question: "Can I share my account with family?",
        answer: "Yes! You can create multiple user profiles for family members with individual watch histories and \
parental controls. The number of simultaneous streams depends on your subscription plan.",
    },
    Faq {
        question: "What video quality is available?",
        answer: "We support up to 4K HDR streaming with Dolby Vision and Atmos audio. \
The actual quality depends on your internet connection and the source material available.",
    },
    Faq {
        question: "How do I cancel my subscription?",
        answer: "You can cancel anytime through your account dashboard by clicking 'Manage Billing'. \
Your access will continue until the end of your current billing period.",
    },
    Faq {
        question: "Is my data secure and private?",
        answer: "Absolutely. Your personal media server is completely private with military-grade encryption. \
We don't track your viewing habits or share any data with third parties.",
    },
    Faq {
        question: "What if I'm having technical issues?",
        answer: "Our support team is available 24/7. You can reach us through the contact form below, \
email us directly, or join our Discord community for real-time help.",
    },
];

pub const SETUP_TITLE: &str = "Emby Setup Guide";

pub const SETUP_SECTIONS: &[SetupSection] = &[
    SetupSection {
        title: "Step 1: Download the Emby App",
        lines: &[
            "Mobile: Download from App Store (iOS) or Google Play Store (Android)",
            "Desktop: Download from emby.media/download.html",
            "TV/Streaming: Available on Roku, Fire TV, Apple TV, and more",
        ],
    },
    SetupSection {
        title: "Step 2: Configure Your Server Connection",
        lines: &[
            "Open the Emby app on your device",
            "Tap \"Add Server\" or \"Connect to Server\"",
            "Server Address: Your Emby server URL (e.g., http://192.168.1.100:8096)",
            "Port: Usually 8096 (HTTP) or 8920 (HTTPS)",
            "Tap \"Connect\" to establish connection",
        ],
    },
    SetupSection {
        title: "Step 3: Sign In to Your Account",
        lines: &[
            "After connecting to the server, you'll see the login screen",
            "Enter your username and password (created through this portal)",
            "If you have multiple users, select your profile",
            "Tap \"Sign In\" to access your media library",
            "Tip: Use the same username and password you created when signing up through this Emby Portal.",
        ],
    },
    SetupSection {
        title: "Key Features & Navigation",
        lines: &[
            "Home: Recently added content and continue watching",
            "Movies: Browse your movie collection",
            "TV Shows: Access all your series and episodes",
            "Music: Listen to your music library",
            "Sync: Download content for offline viewing",
            "Settings: Customize playback, quality, and preferences",
        ],
    },
    SetupSection {
        title: "Common Issues & Solutions",
        lines: &[
            "Can't connect to server: Check your network connection and server address",
            "Login failed: Verify your username/password or contact your administrator",
            "Playback issues: Try lowering video quality in settings",
            "Content not showing: Ensure your account has proper permissions",
            "Need help? Contact your Emby server administrator or check the official Emby documentation at emby.media/support.html",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PlanInterval;

    #[test]
    fn test_static_content_is_complete() {
        assert_eq!(SUPPORT_FAQ.len(), 8);
        assert_eq!(SETUP_SECTIONS.len(), 5);
        assert!(SETUP_SECTIONS.iter().all(|s| !s.lines.is_empty()));
    }

    #[test]
    fn test_starting_price() {
        assert!(starting_price(&[]).is_none());
        let plans = vec![
            Plan {
                plan_id: "a".to_string(),
                name: "Basic".to_string(),
                description: None,
                price: 999,
                currency: "usd".to_string(),
                interval: PlanInterval::Month,
                is_active: true,
                created: 0,
            },
            Plan {
                plan_id: "b".to_string(),
                name: "Premium".to_string(),
                description: None,
                price: 1999,
                currency: "usd".to_string(),
                interval: PlanInterval::Month,
                is_active: true,
                created: 0,
            },
        ];
        assert_eq!(starting_price(&plans).as_deref(), Some("Starting at $9.99/month"));
    }
}
